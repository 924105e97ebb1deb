//! Mock PDF backend for testing.
//!
//! Replays scripted outcomes and records every call, so converter chains
//! can be tested without an office suite installed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::{expected_output, BackendError, PdfBackend};

/// Bytes written by a successful mock conversion.
pub const MOCK_PDF: &[u8] = b"%PDF-1.4\n% docfill mock\n%%EOF\n";

/// Scripted result of one mock conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Write [`MOCK_PDF`] next to the expected output path
    Success,
    Unsupported(String),
    NotFound(String),
    Failed(String),
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub source: PathBuf,
    pub out_dir: PathBuf,
}

/// Mock backend for testing.
#[derive(Clone)]
pub struct MockBackend {
    name: String,
    outcomes: Arc<RwLock<Vec<MockOutcome>>>,
    outcome_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl MockBackend {
    /// Mock that always succeeds.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Arc::new(RwLock::new(Vec::new())),
            outcome_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add an outcome for the next call. Outcomes cycle once exhausted.
    pub fn add_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.write().push(outcome);
        self
    }

    pub fn unsupported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name).add_outcome(MockOutcome::Unsupported(reason.into()))
    }

    pub fn not_found(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name).add_outcome(MockOutcome::NotFound(reason.into()))
    }

    pub fn failing(name: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::new(name).add_outcome(MockOutcome::Failed(diagnostics.into()))
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    fn next_outcome(&self) -> MockOutcome {
        let outcomes = self.outcomes.read();
        if outcomes.is_empty() {
            return MockOutcome::Success;
        }
        let index = self.outcome_index.fetch_add(1, Ordering::SeqCst);
        outcomes
            .get(index % outcomes.len())
            .cloned()
            .unwrap_or(MockOutcome::Success)
    }
}

#[async_trait]
impl PdfBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_convert(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, BackendError> {
        self.captured_calls.write().push(CapturedCall {
            source: source.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
        });

        match self.next_outcome() {
            MockOutcome::Success => {
                let output = expected_output(source, out_dir);
                tokio::fs::write(&output, MOCK_PDF)
                    .await
                    .map_err(|e| BackendError::failed(e.to_string()))?;
                Ok(output)
            }
            MockOutcome::Unsupported(reason) => Err(BackendError::Unsupported(reason)),
            MockOutcome::NotFound(reason) => Err(BackendError::NotFound(reason)),
            MockOutcome::Failed(diagnostics) => Err(BackendError::failed(diagnostics)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.docx");
        let mock = MockBackend::new("mock")
            .add_outcome(MockOutcome::Failed("first".into()))
            .add_outcome(MockOutcome::Success);

        assert_eq!(
            mock.try_convert(&source, dir.path()).await,
            Err(BackendError::failed("first"))
        );
        let pdf = mock.try_convert(&source, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(pdf).unwrap(), MOCK_PDF);
        assert!(mock.try_convert(&source, dir.path()).await.is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.get_calls()[0].source, source);
    }
}
