use async_trait::async_trait;

use super::{Command, CommandExecutor, ExecutionContext};
use crate::core::{DbError, Document, Result, Value};
use crate::query::eval;

/// Counts matching documents.
///
/// This is the canonical long-running scan: with a user predicate attached
/// it can run indefinitely, so it registers in the operation registry and
/// honors a cooperative kill at its checkpoints.
pub struct CountExecutor;

#[async_trait]
impl CommandExecutor for CountExecutor {
    fn name(&self) -> &'static str {
        "count"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Count(_))
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let Command::Count(req) = cmd else {
            return Err(DbError::Internal("count executor got a foreign command".into()));
        };

        let mut query = Document::new();
        query
            .insert("count", req.ns.as_str())
            .insert("query", Value::Document(req.filter.to_document()));
        let guard = ctx.ops.register(&req.ns, query)?;

        let docs = ctx.store.snapshot(&req.ns)?;
        let every = ctx.config.kill_check_every;

        let mut n: i64 = 0;
        for (i, doc) in docs.iter().enumerate() {
            if i % every == 0 {
                guard.checkpoint().await?;
            }
            if eval::matches(&req.filter, doc, &guard).await? {
                n += 1;
            }
        }

        let mut reply = Document::new();
        reply.insert("n", n);
        Ok(reply)
    }
}
