use async_trait::async_trait;

use super::{Command, CommandExecutor, ExecutionContext};
use crate::core::{DbError, Document, Result};

/// Requests cooperative termination of a registered operation.
///
/// The reply only acknowledges that the kill flag was set; the target
/// unwinds at its next checkpoint and its own caller sees the
/// `OperationKilled` error, not the killer.
pub struct KillOpExecutor;

#[async_trait]
impl CommandExecutor for KillOpExecutor {
    fn name(&self) -> &'static str {
        "killOp"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::KillOp { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let Command::KillOp { opid } = cmd else {
            return Err(DbError::Internal("killOp executor got a foreign command".into()));
        };

        ctx.ops.kill(*opid)?;

        let mut reply = Document::new();
        reply.insert("info", "attempting to kill op");
        Ok(reply)
    }
}
