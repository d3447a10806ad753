use std::sync::Arc;

use crate::config::DbConfig;
use crate::ops::OpRegistry;
use crate::storage::Store;

/// Shared state a command executor runs against.
pub struct ExecutionContext<'a> {
    pub store: &'a Store,
    pub ops: &'a Arc<OpRegistry>,
    pub config: &'a DbConfig,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(store: &'a Store, ops: &'a Arc<OpRegistry>, config: &'a DbConfig) -> Self {
        Self { store, ops, config }
    }
}
