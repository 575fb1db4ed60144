use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::{CategoryEntry, CategoryTable};
use crate::error::{CatalogError, Result};
use crate::llm::LlmConfig;
use crate::paths::escapes_root;

/// Starter config written by `auto-catalog init`
const DEFAULT_CONFIG_TEMPLATE: &str = r#"{
  "categories": [
    {
      "path": "Areas",
      "subcategories": ["Finance", "Health", "Home"]
    },
    {
      "path": "Projects",
      "subcategories": ["Work", "Side Projects"]
    },
    {
      "path": "Resources",
      "subcategories": ["Articles", "Books", "Snippets"]
    }
  ],
  "default_path": "Inbox",
  "llm": {
    "provider": "openai",
    "api_base": "https://api.openai.com/v1",
    "model": "gpt-4o-mini",
    "temperature": 0.1
  }
}
"#;

/// Taxonomy, fallback and classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub categories: Vec<CategoryEntry>,

    /// Vault-relative destination used when nothing matches
    pub default_path: String,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl CatalogConfig {
    /// Load and validate a config file.
    ///
    /// `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CatalogError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| CatalogError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self::parse(path, &content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed: std::result::Result<Self, String> = if is_toml {
            toml::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| CatalogError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Reject destinations that could point outside the vault
    pub fn validate(&self) -> Result<()> {
        if self.default_path.trim().is_empty() {
            return Err(invalid("default_path must not be empty"));
        }
        check_relative("default_path", &self.default_path)?;

        for category in &self.categories {
            check_relative("categories[].path", &category.path)?;
            for name in &category.subcategories {
                let trimmed = name.trim();
                if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
                    return Err(invalid(format!(
                        "invalid subcategory {:?} under {:?}",
                        name, category.path
                    )));
                }
                if name.contains(['/', '\\']) {
                    return Err(invalid(format!(
                        "subcategory {:?} under {:?} must be a single folder name",
                        name, category.path
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn category_table(&self) -> Result<CategoryTable> {
        CategoryTable::build(&self.categories, &self.default_path)
    }

    /// Write the starter template; refuses to clobber an existing file
    pub fn init(path: &Path, overwrite: bool) -> Result<PathBuf> {
        if path.exists() && !overwrite {
            return Err(CatalogError::ConfigExists {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(path.to_path_buf())
    }
}

fn invalid(message: impl Into<String>) -> CatalogError {
    CatalogError::InvalidConfig {
        message: message.into(),
    }
}

fn check_relative(field: &str, value: &str) -> Result<()> {
    if escapes_root(value) {
        return Err(invalid(format!(
            "{} must be a vault-relative path without '..': {:?}",
            field, value
        )));
    }
    Ok(())
}
