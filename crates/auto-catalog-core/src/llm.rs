//! LLM Integration Module
//!
//! Classification boundary: hands a note excerpt plus the list of candidate
//! destinations to a language model and returns its one-line answer. The
//! answer is untrusted and must go through
//! [`CategoryTable::resolve`](crate::category::CategoryTable::resolve).
//!
//! ## Usage
//!
//! ```rust
//! use auto_catalog_core::llm::{ClassificationRequest, MAX_CONTENT_CHARS};
//!
//! let text = "a".repeat(MAX_CONTENT_CHARS + 10);
//! let request = ClassificationRequest::new(&text, &["Finance/Invoices"], "Inbox");
//! assert_eq!(request.text.chars().count(), MAX_CONTENT_CHARS);
//! assert!(request.instruction().contains("Finance/Invoices"));
//! ```
//!
//! ### With a real backend
//!
//! ```rust,ignore
//! use auto_catalog_core::llm::{classify, LlmConfig};
//!
//! let classifier = LlmConfig::default().build_classifier(vault.root())?;
//! let answer = classify(classifier.as_ref(), &content, &candidates, "Inbox")?;
//! ```

use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Upper bound on characters of note content sent per request
pub const MAX_CONTENT_CHARS: usize = 3000;

/// Environment variable consulted when the config has no `api_key`
pub const API_KEY_ENV: &str = "AUTO_CATALOG_API_KEY";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// Configuration
// ============================================================================

/// Which backend answers classification requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    /// Any OpenAI-compatible `/chat/completions` endpoint
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// Local `claude` CLI in print mode
    #[serde(rename = "claude-cli")]
    ClaudeCli,
}

/// Classifier connection parameters (`llm` section of the config)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Bearer token; falls back to `AUTO_CATALOG_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL without the `/chat/completions` suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            api_base: None,
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// API key from the config, else from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Construct the configured backend.
    ///
    /// A missing API key or a missing `claude` binary is a setup error and
    /// is reported before any file is touched.
    pub fn build_classifier(&self, working_dir: &Path) -> Result<Box<dyn Classifier>> {
        match self.provider {
            Provider::OpenAi => {
                let api_key = self
                    .resolve_api_key()
                    .ok_or_else(|| CatalogError::InvalidConfig {
                        message: format!("llm.api_key is not set (or export {})", API_KEY_ENV),
                    })?;
                Ok(Box::new(OpenAiClassifier::new(self, api_key)?))
            }
            Provider::ClaudeCli => {
                require_claude_cli()?;
                // the default model name belongs to the OpenAI backend
                let model = (self.model != DEFAULT_MODEL).then(|| self.model.clone());
                Ok(Box::new(ClaudeCliClassifier::new(
                    working_dir.to_path_buf(),
                    model,
                )))
            }
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// One classification call: bounded text plus the candidate destinations
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub text: String,
    pub candidates: Vec<String>,
    pub fallback: String,
}

impl ClassificationRequest {
    pub fn new<S: AsRef<str>>(text: &str, candidates: &[S], fallback: &str) -> Self {
        Self {
            text: truncate_chars(text, MAX_CONTENT_CHARS).to_string(),
            candidates: candidates.iter().map(|c| c.as_ref().to_string()).collect(),
            fallback: fallback.to_string(),
        }
    }

    /// System prompt enumerating every candidate verbatim
    pub fn instruction(&self) -> String {
        format!(
            "Choose the single best matching category for the note from the options below. \
             Reply with the full path only, exactly as written, and nothing else.\n\
             Options: {}\n\
             If no option applies, reply with: {}",
            self.candidates.join(", "),
            self.fallback
        )
    }

    pub fn user_message(&self) -> String {
        format!("Classify the following content:\n{}", self.text)
    }
}

/// Longest prefix of `text` with at most `max` chars
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// Backends
// ============================================================================

/// External classifier seam: text + candidates in, one free-form string out
pub trait Classifier {
    fn complete(&self, request: &ClassificationRequest) -> Result<String>;
}

/// Classify `text` against `candidates` and return the trimmed raw answer.
///
/// Failures are returned as-is; there is no retry and no caching.
pub fn classify<S: AsRef<str>>(
    classifier: &dyn Classifier,
    text: &str,
    candidates: &[S],
    fallback: &str,
) -> Result<String> {
    let request = ClassificationRequest::new(text, candidates, fallback);
    let answer = classifier.complete(&request)?;
    Ok(answer.trim().to_string())
}

/// Blocking client for OpenAI-compatible chat completion endpoints
pub struct OpenAiClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClassifier {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| CatalogError::Classification {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base()),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

impl Classifier for OpenAiClassifier {
    fn complete(&self, request: &ClassificationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_message(),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| CatalogError::Classification {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(CatalogError::Classification {
                message: format!("API error ({}): {}", status, text.trim()),
            });
        }

        let parsed: ChatResponse = response.json().map_err(|e| CatalogError::Classification {
            message: format!("Failed to parse response: {}", e),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CatalogError::Classification {
                message: "Empty response from model".to_string(),
            })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Classifier backed by the local Claude CLI
pub struct ClaudeCliClassifier {
    working_dir: PathBuf,
    model: Option<String>,
}

impl ClaudeCliClassifier {
    pub fn new(working_dir: PathBuf, model: Option<String>) -> Self {
        Self { working_dir, model }
    }
}

impl Classifier for ClaudeCliClassifier {
    fn complete(&self, request: &ClassificationRequest) -> Result<String> {
        let prompt = format!("{}\n\n{}", request.instruction(), request.user_message());
        execute_claude(&self.working_dir, self.model.as_deref(), &prompt)
    }
}

// ============================================================================
// CLI Operations
// ============================================================================

/// `claude --version` succeeds
pub fn check_claude_cli() -> bool {
    Command::new("claude")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Pipe `prompt` to `claude --print` and return its stdout
pub fn execute_claude(working_dir: &Path, model: Option<&str>, prompt: &str) -> Result<String> {
    let mut cmd = Command::new("claude");
    cmd.arg("--print");
    if let Some(model) = model {
        cmd.args(["--model", model]);
    }
    cmd.current_dir(working_dir);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| CatalogError::Classification {
        message: format!("Failed to spawn claude: {}", e),
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .map_err(|e| CatalogError::Classification {
                message: format!("Failed to write prompt: {}", e),
            })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| CatalogError::Classification {
            message: format!("Execution failed: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CatalogError::Classification {
            message: format!("Claude exited with error: {}", stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Fail with `ClaudeNotFound` unless the CLI is installed
pub fn require_claude_cli() -> Result<()> {
    if !check_claude_cli() {
        return Err(CatalogError::ClaudeNotFound);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        answer: String,
        seen: RefCell<Vec<ClassificationRequest>>,
    }

    impl Classifier for Recording {
        fn complete(&self, request: &ClassificationRequest) -> Result<String> {
            self.seen.borrow_mut().push(request.clone());
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_llm_config_deserialize() {
        let json = r#"{
            "provider": "claude-cli",
            "api_base": "http://localhost:11434/v1/",
            "model": "sonnet",
            "temperature": 0.0
        }"#;
        let config: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider, Provider::ClaudeCli);
        assert_eq!(config.api_base(), "http://localhost:11434/v1");
        assert_eq!(config.temperature, 0.0);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_llm_config_deserialize_toml_empty() {
        let config: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
    }

    #[test]
    fn test_config_api_key_takes_precedence() {
        let config = LlmConfig {
            api_key: Some("sk-config".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-config"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "日本語のノート";
        assert_eq!(truncate_chars(text, 3), "日本語");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_instruction_lists_every_candidate_and_fallback() {
        let request = ClassificationRequest::new(
            "body",
            &["Finance/Invoices", "Projects/Rust Crates"],
            "Inbox/Unsorted",
        );
        let instruction = request.instruction();
        assert!(instruction.contains("Finance/Invoices, Projects/Rust Crates"));
        assert!(instruction.contains("reply with: Inbox/Unsorted"));
        assert!(request.user_message().ends_with("body"));
    }

    #[test]
    fn test_classify_truncates_and_trims() {
        let backend = Recording {
            answer: "  Finance/Invoices\n".to_string(),
            seen: RefCell::new(Vec::new()),
        };
        let text = "x".repeat(MAX_CONTENT_CHARS * 2);

        let answer = classify(&backend, &text, &["Finance/Invoices"], "Inbox").unwrap();

        assert_eq!(answer, "Finance/Invoices");
        let seen = backend.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].text.len(), MAX_CONTENT_CHARS);
        assert_eq!(seen[0].candidates, vec!["Finance/Invoices".to_string()]);
    }

    #[test]
    fn test_classify_is_not_cached() {
        let backend = Recording {
            answer: "Inbox".to_string(),
            seen: RefCell::new(Vec::new()),
        };
        classify(&backend, "same", &["A/B"], "Inbox").unwrap();
        classify(&backend, "same", &["A/B"], "Inbox").unwrap();
        assert_eq!(backend.seen.borrow().len(), 2);
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Finance/Taxes"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Finance/Taxes")
        );
    }
}
