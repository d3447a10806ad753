use async_trait::async_trait;
use log::debug;

use super::{Command, ExecutionContext};
use crate::core::{DbError, Document, Result};

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, cmd: &Command) -> bool;

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document>;
}

/// Ordered list of executors; the first one claiming a command runs it.
pub struct CommandPipeline {
    executors: Vec<Box<dyn CommandExecutor>>,
}

impl CommandPipeline {
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    pub fn register(&mut self, executor: Box<dyn CommandExecutor>) {
        self.executors.push(executor);
    }

    pub async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        for executor in &self.executors {
            if executor.can_handle(cmd) {
                debug!("dispatching {:?} to {}", cmd, executor.name());
                return executor.execute(cmd, ctx).await;
            }
        }
        Err(DbError::UnsupportedCommand(format!("{:?}", cmd)))
    }
}

impl Default for CommandPipeline {
    fn default() -> Self {
        Self::new()
    }
}
