use async_trait::async_trait;

use super::{Command, CommandExecutor, ExecutionContext};
use crate::core::{Document, Result, Value};

/// Reports a snapshot of every in-flight operation under `inprog`.
pub struct CurrentOpExecutor;

#[async_trait]
impl CommandExecutor for CurrentOpExecutor {
    fn name(&self) -> &'static str {
        "currentOp"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::CurrentOp)
    }

    async fn execute(&self, _cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<Document> {
        let inprog: Vec<Value> = ctx
            .ops
            .list_in_progress()?
            .iter()
            .map(|op| Value::Document(op.to_document()))
            .collect();

        let mut reply = Document::new();
        reply.insert("inprog", Value::Array(inprog));
        Ok(reply)
    }
}
