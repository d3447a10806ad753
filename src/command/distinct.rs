use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{Command, CommandExecutor, DistinctMode, ExecutionContext};
use crate::core::{DbError, Document, Result, Value};
use crate::query::eval;

/// Collects the distinct values of a field path across matching documents,
/// or just their cardinality in count-only mode.
pub struct DistinctExecutor;

#[async_trait]
impl CommandExecutor for DistinctExecutor {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Distinct(_))
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let Command::Distinct(req) = cmd else {
            return Err(DbError::Internal("distinct executor got a foreign command".into()));
        };
        if req.key.is_empty() {
            return Err(DbError::InvalidArgument(
                "distinct requires a non-empty key".into(),
            ));
        }

        let mut query = Document::new();
        query
            .insert("distinct", req.ns.as_str())
            .insert("key", req.key.as_str())
            .insert("query", Value::Document(req.filter.to_document()));
        // Registered before any killable work begins; the guard unregisters
        // on every exit path below.
        let guard = ctx.ops.register(&req.ns, query)?;

        let docs = ctx.store.snapshot(&req.ns)?;
        let every = ctx.config.kill_check_every;

        // The set is keyed by the canonical cross-type order, which both
        // deduplicates and yields the ascending response order for free.
        let mut set: BTreeSet<Value> = BTreeSet::new();
        for (i, doc) in docs.iter().enumerate() {
            if i % every == 0 {
                guard.checkpoint().await?;
            }
            if !eval::matches(&req.filter, doc, &guard).await? {
                continue;
            }
            let mut values = Vec::new();
            doc.extract_path(&req.key, &mut values);
            set.extend(values);
        }

        let mut reply = Document::new();
        match req.mode {
            DistinctMode::CountOnly => reply.insert("count", set.len() as i64),
            DistinctMode::Full => {
                reply.insert("values", Value::Array(set.into_iter().collect()))
            }
        };
        Ok(reply)
    }
}
