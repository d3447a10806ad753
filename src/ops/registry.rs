use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::core::{DbError, Document, Result, Value};

/// Tracker of in-flight long-running operations.
///
/// One registry is owned by the `Db` facade and handed by reference to every
/// command; it is the only shared mutable state between independent
/// operations, and the mutex serializes every transition so no caller sees a
/// torn registry.
pub struct OpRegistry {
    next_opid: AtomicU64,
    inner: Mutex<HashMap<u64, OpEntry>>,
}

struct OpEntry {
    ns: String,
    query: Document,
    started_at: DateTime<Utc>,
    /// Set once a kill has been requested; the snapshot reports the entry as
    /// no longer active from that point, even though the operation has not
    /// unwound yet.
    kill_requested: bool,
    kill: Arc<AtomicBool>,
}

/// Point-in-time copy of one registered operation.
///
/// Snapshots may be stale by the time they are consumed: an operation can
/// finish between `list_in_progress` and any use of its opid. That race is
/// part of the contract; a kill against a vanished opid reports `OpNotFound`.
#[derive(Debug, Clone, Serialize)]
pub struct OpSnapshot {
    pub opid: u64,
    pub ns: String,
    pub active: bool,
    pub query: Document,
    pub started_at: DateTime<Utc>,
}

impl OpSnapshot {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("opid", self.opid as i64)
            .insert("ns", self.ns.as_str())
            .insert("active", self.active)
            .insert("query", Value::Document(self.query.clone()))
            .insert("started_at", self.started_at.to_rfc3339());
        doc
    }
}

impl OpRegistry {
    pub fn new() -> Self {
        Self {
            next_opid: AtomicU64::new(1),
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register an operation and return the guard that owns its lifetime.
    ///
    /// The entry is visible in the registry before this returns, so a kill
    /// issued by a racing client cannot slip in ahead of registration and be
    /// lost. The guard unregisters on drop, on every exit path.
    pub fn register(self: &Arc<Self>, ns: &str, query: Document) -> Result<OpGuard> {
        let opid = self.next_opid.fetch_add(1, Ordering::SeqCst);
        let kill = Arc::new(AtomicBool::new(false));

        let entry = OpEntry {
            ns: ns.to_string(),
            query,
            started_at: Utc::now(),
            kill_requested: false,
            kill: Arc::clone(&kill),
        };
        self.inner.lock()?.insert(opid, entry);
        debug!("op {} registered on {}", opid, ns);

        Ok(OpGuard {
            opid,
            kill,
            registry: Arc::clone(self),
        })
    }

    /// Copy of every currently registered operation, ordered by opid.
    pub fn list_in_progress(&self) -> Result<Vec<OpSnapshot>> {
        let inner = self.inner.lock()?;
        let mut ops: Vec<OpSnapshot> = inner
            .iter()
            .map(|(opid, entry)| OpSnapshot {
                opid: *opid,
                ns: entry.ns.clone(),
                active: !entry.kill_requested,
                query: entry.query.clone(),
                started_at: entry.started_at,
            })
            .collect();
        ops.sort_by_key(|op| op.opid);
        Ok(ops)
    }

    /// Request cooperative termination of one operation.
    ///
    /// Sets the operation's kill flag; the running task notices it at its
    /// next checkpoint and unwinds with `OperationKilled`. Killing an opid
    /// that finished (or never existed) is `OpNotFound`, never fatal, and
    /// touches no other operation.
    pub fn kill(&self, opid: u64) -> Result<()> {
        let mut inner = self.inner.lock()?;
        let entry = inner.get_mut(&opid).ok_or(DbError::OpNotFound(opid))?;
        entry.kill_requested = true;
        entry.kill.store(true, Ordering::SeqCst);
        info!("kill requested for op {} on {}", opid, entry.ns);
        Ok(())
    }

    fn unregister(&self, opid: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.remove(&opid);
            debug!("op {} unregistered", opid);
        }
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII handle for a registered operation.
///
/// Held by the running command for its whole execution; dropping it (return,
/// error, or kill-unwind alike) removes the entry from the registry as the
/// last action before the response leaves.
pub struct OpGuard {
    opid: u64,
    kill: Arc<AtomicBool>,
    registry: Arc<OpRegistry>,
}

impl OpGuard {
    pub fn opid(&self) -> u64 {
        self.opid
    }

    pub fn killed(&self) -> bool {
        self.kill.load(Ordering::SeqCst)
    }

    /// Fail with `OperationKilled` once a kill has been requested.
    pub fn check_killed(&self) -> Result<()> {
        if self.killed() {
            Err(DbError::OperationKilled(self.opid))
        } else {
            Ok(())
        }
    }

    /// Cancellation checkpoint: observe a pending kill, then yield so
    /// sibling tasks (including the killer) get scheduled.
    pub async fn checkpoint(&self) -> Result<()> {
        self.check_killed()?;
        tokio::task::yield_now().await;
        Ok(())
    }
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.opid);
    }
}
