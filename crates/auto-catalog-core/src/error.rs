use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Vault root not found: no '.obsidian' directory above {start}")]
    VaultNotFound { start: PathBuf },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Config file already exists: {path} (use --force to overwrite)")]
    ConfigExists { path: PathBuf },

    #[error("File not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Not a text file, cannot read content: {path}")]
    NotText { path: PathBuf },

    #[error("Invalid source path: {path}")]
    InvalidSource { path: PathBuf },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("Claude CLI not found. Install it or set llm.provider to \"openai\"")]
    ClaudeNotFound,

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Destination leaves the vault: {destination}")]
    UnsafeDestination { destination: String },

    #[error("Destination already exists: {path} (use --force to overwrite)")]
    DestinationExists { path: PathBuf },

    #[error("Failed to move {from} -> {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("{failed} of {total} files could not be processed")]
    BatchFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Errors that abort the run before any file is processed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::VaultNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse { .. }
                | Self::InvalidConfig { .. }
                | Self::ClaudeNotFound
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::VaultNotFound { .. } => 2,
            Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::InvalidConfig { .. }
            | Self::ConfigExists { .. } => 3,
            Self::BatchFailed { .. } => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let fatal = CatalogError::VaultNotFound {
            start: PathBuf::from("/tmp"),
        };
        assert!(fatal.is_fatal());
        assert_eq!(fatal.exit_code(), 2);

        let per_file = CatalogError::Classification {
            message: "rate limited".to_string(),
        };
        assert!(!per_file.is_fatal());
        assert_eq!(per_file.exit_code(), 1);

        let batch = CatalogError::BatchFailed {
            failed: 1,
            total: 3,
        };
        assert!(!batch.is_fatal());
        assert_eq!(batch.exit_code(), 4);
        assert_eq!(batch.to_string(), "1 of 3 files could not be processed");
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = CatalogError::NotText {
            path: PathBuf::from("notes/blob.md"),
        };
        assert!(err.to_string().contains("notes/blob.md"));
    }
}
