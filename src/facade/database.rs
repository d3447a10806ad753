use std::sync::Arc;

use log::debug;

use crate::command::admin::{DropExecutor, ValidateExecutor};
use crate::command::count::CountExecutor;
use crate::command::current_op::CurrentOpExecutor;
use crate::command::distinct::DistinctExecutor;
use crate::command::kill_op::KillOpExecutor;
use crate::command::{
    Command, CommandPipeline, CountRequest, DistinctMode, DistinctRequest, ExecutionContext,
};
use crate::config::DbConfig;
use crate::core::{DbError, Document, Result, Value};
use crate::ops::{OpRegistry, OpSnapshot};
use crate::query::Filter;
use crate::storage::Store;

struct DbInner {
    store: Store,
    ops: Arc<OpRegistry>,
    pipeline: CommandPipeline,
    config: DbConfig,
}

/// Handle to one in-memory database.
///
/// Cheap to clone; clones share the store and the operation registry, so a
/// task holding one clone can observe and kill operations started from
/// another. The registry is owned here and injected into every command,
/// never reached through ambient global state.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

impl Db {
    pub fn new() -> Self {
        Self::with_config(DbConfig::default())
    }

    pub fn with_config(config: DbConfig) -> Self {
        let mut pipeline = CommandPipeline::new();
        pipeline.register(Box::new(DistinctExecutor));
        pipeline.register(Box::new(CountExecutor));
        pipeline.register(Box::new(CurrentOpExecutor));
        pipeline.register(Box::new(KillOpExecutor));
        pipeline.register(Box::new(ValidateExecutor));
        pipeline.register(Box::new(DropExecutor));

        Self {
            inner: Arc::new(DbInner {
                store: Store::new(),
                ops: Arc::new(OpRegistry::new()),
                pipeline,
                config,
            }),
        }
    }

    /// Execute a wire command document and return the response document.
    pub async fn run_command(&self, doc: Document) -> Result<Document> {
        let cmd = Command::parse(&doc)?;
        self.execute(&cmd).await
    }

    async fn execute(&self, cmd: &Command) -> Result<Document> {
        let inner = &self.inner;
        let ctx = ExecutionContext::new(&inner.store, &inner.ops, &inner.config);
        inner.pipeline.execute(cmd, &ctx).await
    }

    // ------------------------------------------------------------------
    // Typed surface
    // ------------------------------------------------------------------

    pub fn save(&self, ns: &str, doc: Document) -> Result<()> {
        self.inner.store.save(ns, doc)
    }

    pub fn create_collection(&self, ns: &str) -> Result<()> {
        self.inner.store.create_collection(ns)
    }

    pub fn drop_collection(&self, ns: &str) -> Result<bool> {
        debug!("dropping collection {}", ns);
        self.inner.store.drop_collection(ns)
    }

    /// Sorted distinct values of `key` across documents matching `filter`.
    pub async fn distinct(&self, ns: &str, key: &str, filter: Filter) -> Result<Vec<Value>> {
        let reply = self
            .execute(&Command::Distinct(DistinctRequest {
                ns: ns.to_string(),
                key: key.to_string(),
                filter,
                mode: DistinctMode::Full,
            }))
            .await?;
        match reply.get("values") {
            Some(Value::Array(values)) => Ok(values.clone()),
            _ => Err(DbError::Internal("distinct reply missing values".into())),
        }
    }

    /// Cardinality of the distinct set, without materializing it in the
    /// response.
    pub async fn distinct_count(&self, ns: &str, key: &str, filter: Filter) -> Result<u64> {
        let reply = self
            .execute(&Command::Distinct(DistinctRequest {
                ns: ns.to_string(),
                key: key.to_string(),
                filter,
                mode: DistinctMode::CountOnly,
            }))
            .await?;
        reply
            .get("count")
            .and_then(Value::as_i64)
            .map(|n| n as u64)
            .ok_or_else(|| DbError::Internal("distinct reply missing count".into()))
    }

    /// Number of documents matching `filter`. This is the entry point for
    /// attaching a `WherePredicate` via `Filter::where_fn`; such a count
    /// runs until its verdicts arrive or the operation is killed.
    pub async fn count(&self, ns: &str, filter: Filter) -> Result<u64> {
        let reply = self
            .execute(&Command::Count(CountRequest {
                ns: ns.to_string(),
                filter,
            }))
            .await?;
        reply
            .get("n")
            .and_then(Value::as_i64)
            .map(|n| n as u64)
            .ok_or_else(|| DbError::Internal("count reply missing n".into()))
    }

    /// Snapshot of in-flight operations; may be stale by the time it is
    /// read.
    pub fn current_op(&self) -> Result<Vec<OpSnapshot>> {
        self.inner.ops.list_in_progress()
    }

    /// Request cooperative termination of one operation.
    pub fn kill_op(&self, opid: u64) -> Result<()> {
        self.inner.ops.kill(opid)
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}
