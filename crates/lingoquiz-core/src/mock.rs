//! In-memory collaborators for testing sessions without real storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::QuizContent;
use crate::report::AttemptRecord;
use crate::traits::{AttemptSink, ContentSource};

/// Collects saved attempts in memory.
///
/// Can be told to fail every save to exercise error paths.
#[derive(Default)]
pub struct InMemorySink {
    saved: Mutex<Vec<AttemptRecord>>,
    call_count: AtomicU32,
    fail_with: Option<String>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Number of save calls, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Records saved so far.
    pub fn saved(&self) -> Vec<AttemptRecord> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AttemptSink for InMemorySink {
    async fn save(&self, record: &AttemptRecord) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Serves quizzes from a fixed map keyed by content id.
pub struct StaticContentSource {
    quizzes: HashMap<String, QuizContent>,
}

impl StaticContentSource {
    pub fn new(quizzes: impl IntoIterator<Item = QuizContent>) -> Self {
        Self {
            quizzes: quizzes.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn load(&self, content_id: &str) -> anyhow::Result<QuizContent> {
        self.quizzes
            .get(content_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no quiz for content {content_id}"))
    }
}
