//! Collaborator traits at the edges of the engine.
//!
//! Content loading and attempt persistence live outside this crate. The
//! engine only talks to them through these async traits.

use async_trait::async_trait;

use crate::model::QuizContent;
use crate::report::AttemptRecord;

/// Supplies quiz content by content id.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Load the quiz for a piece of learning content.
    async fn load(&self, content_id: &str) -> anyhow::Result<QuizContent>;
}

/// Stores finished attempts.
///
/// Associating a record with a user and retrying failed writes are the
/// implementor's concern.
#[async_trait]
pub trait AttemptSink: Send + Sync {
    async fn save(&self, record: &AttemptRecord) -> anyhow::Result<()>;
}
