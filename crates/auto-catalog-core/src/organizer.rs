//! Per-file pipeline: read → classify → resolve → plan → move.
//!
//! Everything the pipeline needs is borrowed from the caller; nothing is
//! global.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::category::CategoryTable;
use crate::error::{CatalogError, Result};
use crate::llm::{classify, truncate_chars, Classifier, MAX_CONTENT_CHARS};
use crate::relocate::{MoveOutcome, MovePlan, Relocator, RunMode};
use crate::resolve::Resolution;
use crate::vault::Vault;

/// Result of processing one file successfully
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub resolution: Resolution,
    pub plan: MovePlan,
    /// `None` in preview mode
    pub moved: Option<MoveOutcome>,
}

/// Per-file report handed to the batch observer
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<FileOutcome>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub moved: usize,
    pub previewed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.moved + self.previewed + self.unchanged + self.failed
    }
}

pub struct Organizer<'a> {
    vault: &'a Vault,
    table: &'a CategoryTable,
    classifier: &'a dyn Classifier,
    relocator: Relocator,
}

impl<'a> Organizer<'a> {
    pub fn new(
        vault: &'a Vault,
        table: &'a CategoryTable,
        classifier: &'a dyn Classifier,
        relocator: Relocator,
    ) -> Self {
        Self {
            vault,
            table,
            classifier,
            relocator,
        }
    }

    /// Classify a file and resolve the answer to a known destination
    pub fn predict(&self, path: &Path) -> Result<Resolution> {
        let excerpt = read_excerpt(path)?;
        let candidates = self.table.destinations();
        let raw = classify(self.classifier, &excerpt, &candidates, self.table.fallback())?;
        Ok(self.table.resolve(&raw))
    }

    pub fn plan(&self, path: &Path) -> Result<(Resolution, MovePlan)> {
        let resolution = self.predict(path)?;
        let plan = MovePlan::new(path, &resolution.destination, self.vault)?;
        Ok((resolution, plan))
    }

    pub fn process(&self, path: &Path, mode: RunMode) -> Result<FileOutcome> {
        let (resolution, plan) = self.plan(path)?;
        let moved = match mode {
            RunMode::Preview => None,
            RunMode::Apply => Some(self.relocator.execute(&plan)?),
        };
        Ok(FileOutcome {
            resolution,
            plan,
            moved,
        })
    }

    /// Process files in order; a failing file never stops the rest
    pub fn process_batch<F>(
        &self,
        files: &[PathBuf],
        mode: RunMode,
        mut on_report: F,
    ) -> BatchSummary
    where
        F: FnMut(&FileReport),
    {
        let mut summary = BatchSummary::default();

        for path in files {
            let result = self.process(path, mode);
            match &result {
                Ok(outcome) => match outcome.moved {
                    None => summary.previewed += 1,
                    Some(MoveOutcome::AlreadyInPlace) => summary.unchanged += 1,
                    Some(MoveOutcome::Moved | MoveOutcome::Replaced) => summary.moved += 1,
                },
                Err(_) => summary.failed += 1,
            }
            on_report(&FileReport {
                path: path.clone(),
                result,
            });
        }

        summary
    }
}

/// Bytes read from the head of a note; enough for [`MAX_CONTENT_CHARS`]
/// characters of any UTF-8 text
const EXCERPT_BYTES: u64 = (MAX_CONTENT_CHARS * 4) as u64;

/// First [`MAX_CONTENT_CHARS`] characters of a UTF-8 file.
///
/// Only the head of the file is read. Bytes past the excerpt are never
/// decoded, so a bad byte there does not make the note unreadable.
pub fn read_excerpt(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatalogError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => CatalogError::Io(e),
    })?;

    let mut bytes = Vec::new();
    file.take(EXCERPT_BYTES).read_to_end(&mut bytes)?;

    let not_text = || CatalogError::NotText {
        path: path.to_path_buf(),
    };
    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(e) => {
            let valid = std::str::from_utf8(&bytes[..e.valid_up_to()]).map_err(|_| not_text())?;
            // a sequence cut at the end of the read is fine; a bad byte
            // inside the excerpt is not
            if e.error_len().is_some() && valid.chars().count() < MAX_CONTENT_CHARS {
                return Err(not_text());
            }
            valid
        }
    };

    Ok(truncate_chars(text, MAX_CONTENT_CHARS).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryEntry;
    use crate::config::CatalogConfig;
    use crate::llm::{ClassificationRequest, LlmConfig};
    use crate::vault::VAULT_MARKER;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Answers by looking for a keyword in the note body
    struct Scripted {
        answers: HashMap<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(answers: &[(&'static str, &'static str)]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl Classifier for Scripted {
        fn complete(&self, request: &ClassificationRequest) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            if request.text.contains("FAIL") {
                return Err(CatalogError::Classification {
                    message: "429 rate limited".to_string(),
                });
            }
            let answer = self
                .answers
                .iter()
                .find(|(keyword, _)| request.text.contains(*keyword))
                .map(|(_, answer)| answer.to_string())
                .unwrap_or_else(|| "I cannot determine this".to_string());
            Ok(answer)
        }
    }

    struct Setup {
        _temp: TempDir,
        vault: Vault,
        table: CategoryTable,
    }

    fn setup() -> Setup {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(VAULT_MARKER)).unwrap();
        let vault = Vault::locate(temp.path()).unwrap();
        let config = CatalogConfig {
            categories: vec![CategoryEntry {
                path: "Finance".to_string(),
                subcategories: vec!["Invoices".to_string(), "Taxes".to_string()],
            }],
            default_path: "Inbox/Unsorted".to_string(),
            llm: LlmConfig::default(),
        };
        let table = config.category_table().unwrap();
        Setup {
            _temp: temp,
            vault,
            table,
        }
    }

    fn note(vault: &Vault, name: &str, body: &str) -> PathBuf {
        let dir = vault.root().join("Inbox");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn organizer<'a>(s: &'a Setup, classifier: &'a dyn Classifier) -> Organizer<'a> {
        Organizer::new(&s.vault, &s.table, classifier, Relocator::default())
    }

    #[test]
    fn test_exact_answer_moves_into_category() {
        let s = setup();
        let classifier = Scripted::new(&[("invoice", "Finance/Invoices")]);
        let source = note(&s.vault, "bill.md", "invoice #42");

        let outcome = organizer(&s, &classifier)
            .process(&source, RunMode::Apply)
            .unwrap();

        assert_eq!(outcome.resolution.destination.as_str(), "Finance/Invoices");
        assert_eq!(outcome.moved, Some(MoveOutcome::Moved));
        let target = s.vault.root().join("Finance/Invoices/bill.md");
        assert_eq!(fs::read_to_string(target).unwrap(), "invoice #42");
        assert!(!source.exists());
    }

    #[test]
    fn test_messy_answer_resolves_by_last_segment() {
        let s = setup();
        let classifier = Scripted::new(&[("invoice", "/some/invoices/")]);
        let source = note(&s.vault, "bill.md", "invoice #42");

        let resolution = organizer(&s, &classifier).predict(&source).unwrap();

        assert_eq!(resolution.raw, "/some/invoices/");
        assert_eq!(resolution.destination.as_str(), "Finance/Invoices");
    }

    #[test]
    fn test_unrelated_answer_goes_to_default_path() {
        let s = setup();
        let classifier = Scripted::new(&[]);
        let source = note(&s.vault, "misc.md", "shopping list");

        let outcome = organizer(&s, &classifier)
            .process(&source, RunMode::Apply)
            .unwrap();

        assert_eq!(outcome.resolution.destination.as_str(), "Inbox/Unsorted");
        assert!(s.vault.root().join("Inbox/Unsorted/misc.md").exists());
    }

    #[test]
    fn test_preview_matches_apply_without_touching_disk() {
        let s = setup();
        let classifier = Scripted::new(&[("tax", "Finance/Taxes")]);
        let source = note(&s.vault, "return.md", "tax return 2025");
        let org = organizer(&s, &classifier);

        let preview = org.process(&source, RunMode::Preview).unwrap();

        assert!(preview.moved.is_none());
        assert!(source.exists());
        assert!(!s.vault.root().join("Finance").exists());

        let applied = org.process(&source, RunMode::Apply).unwrap();
        assert_eq!(preview.plan, applied.plan);
        assert!(applied.plan.target.exists());
    }

    #[test]
    fn test_one_failure_does_not_stop_the_batch() {
        let s = setup();
        let classifier =
            Scripted::new(&[("invoice", "Finance/Invoices"), ("tax", "Finance/Taxes")]);
        let files = vec![
            note(&s.vault, "a.md", "invoice"),
            note(&s.vault, "b.md", "FAIL"),
            note(&s.vault, "c.md", "tax"),
        ];

        let mut reports = Vec::new();
        let summary = organizer(&s, &classifier).process_batch(&files, RunMode::Apply, |r| {
            reports.push((r.path.clone(), r.result.is_ok()))
        });

        assert_eq!(classifier.calls.get(), 3);
        assert_eq!(
            summary,
            BatchSummary {
                moved: 2,
                previewed: 0,
                unchanged: 0,
                failed: 1,
            }
        );
        assert_eq!(reports.len(), 3);
        assert!(!reports[1].1);
        assert!(s.vault.root().join("Finance/Invoices/a.md").exists());
        assert!(s.vault.root().join("Finance/Taxes/c.md").exists());
        assert!(files[1].exists());
    }

    #[test]
    fn test_binary_file_is_not_text() {
        let s = setup();
        let classifier = Scripted::new(&[]);
        let path = s.vault.root().join("blob.md");
        fs::write(&path, [0xffu8, 0xfe, 0x00, 0x9f]).unwrap();

        let err = organizer(&s, &classifier).predict(&path).unwrap_err();

        assert!(matches!(err, CatalogError::NotText { .. }));
        assert_eq!(classifier.calls.get(), 0);
    }

    #[test]
    fn test_vanished_file_is_reported() {
        let s = setup();
        let classifier = Scripted::new(&[]);
        let err = organizer(&s, &classifier)
            .process(&s.vault.root().join("gone.md"), RunMode::Apply)
            .unwrap_err();
        assert!(matches!(err, CatalogError::SourceNotFound { .. }));
    }

    #[test]
    fn test_read_excerpt_is_bounded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("long.md");
        fs::write(&path, "é".repeat(MAX_CONTENT_CHARS + 50)).unwrap();
        let excerpt = read_excerpt(&path).unwrap();
        assert_eq!(excerpt.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_bad_byte_after_excerpt_is_ignored() {
        let s = setup();
        let classifier = Scripted::new(&[("invoice", "Finance/Invoices")]);
        let mut body = "invoice ".repeat(1000).into_bytes();
        body.push(0xff);
        let path = s.vault.root().join("Inbox/n.md");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();

        let resolution = organizer(&s, &classifier).predict(&path).unwrap();

        assert_eq!(resolution.destination.as_str(), "Finance/Invoices");
    }

    #[test]
    fn test_read_excerpt_reads_only_the_head() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("huge.md");
        let mut body = "a".repeat(EXCERPT_BYTES as usize + 10).into_bytes();
        body.extend_from_slice(&[0xff, 0xfe]);
        fs::write(&path, body).unwrap();

        let excerpt = read_excerpt(&path).unwrap();
        assert_eq!(excerpt, "a".repeat(MAX_CONTENT_CHARS));
    }

    #[test]
    fn test_multibyte_char_cut_at_read_limit_is_accepted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cjk.md");
        // the read limit falls inside a three-byte char
        fs::write(&path, format!("a{}", "日".repeat(4001))).unwrap();

        let excerpt = read_excerpt(&path).unwrap();
        assert_eq!(excerpt.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_escaping_default_path_never_reaches_the_pipeline() {
        let config = CatalogConfig {
            categories: vec![],
            default_path: "../escaped".to_string(),
            llm: LlmConfig::default(),
        };
        assert!(matches!(
            config.category_table(),
            Err(CatalogError::InvalidConfig { .. })
        ));
    }
}
