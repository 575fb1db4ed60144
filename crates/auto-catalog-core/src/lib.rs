pub mod category;
pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod organizer;
pub mod paths;
pub mod relocate;
pub mod resolve;
pub mod vault;

pub use category::{CategoryEntry, CategoryTable, KeyCollision};
pub use config::CatalogConfig;
pub use discovery::{discover_markdown, Discovery};
pub use error::{CatalogError, Result};
pub use llm::{
    check_claude_cli, classify, execute_claude, require_claude_cli, ClassificationRequest,
    Classifier, ClaudeCliClassifier, LlmConfig, OpenAiClassifier, Provider,
};
pub use organizer::{BatchSummary, FileOutcome, FileReport, Organizer};
pub use relocate::{MoveOutcome, MovePlan, Relocator, RunMode};
pub use resolve::{MatchKind, Resolution, ResolvedDestination};
pub use vault::{find_vault_root, Vault, VAULT_MARKER};
