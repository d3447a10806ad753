use async_trait::async_trait;

use super::{Command, CommandExecutor, ExecutionContext};
use crate::core::{DbError, Document, Result};

/// Reports basic integrity facts about one collection. An in-memory store
/// has no on-disk extents to walk, so the record count is the whole story.
pub struct ValidateExecutor;

#[async_trait]
impl CommandExecutor for ValidateExecutor {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Validate { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let Command::Validate { ns } = cmd else {
            return Err(DbError::Internal("validate executor got a foreign command".into()));
        };

        let n_records = ctx.store.record_count(ns)?;

        let mut reply = Document::new();
        reply
            .insert("ns", ns.as_str())
            .insert("n_records", n_records as i64)
            .insert("valid", true);
        Ok(reply)
    }
}

/// Drops a collection. Dropping an absent collection succeeds and says so.
pub struct DropExecutor;

#[async_trait]
impl CommandExecutor for DropExecutor {
    fn name(&self) -> &'static str {
        "drop"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Drop { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let Command::Drop { ns } = cmd else {
            return Err(DbError::Internal("drop executor got a foreign command".into()));
        };

        let existed = ctx.store.drop_collection(ns)?;

        let mut reply = Document::new();
        reply.insert("ns", ns.as_str()).insert("dropped", existed);
        Ok(reply)
    }
}
