use std::cmp::Ordering;

use async_recursion::async_recursion;

use crate::core::{Document, Result, Value};
use crate::ops::OpGuard;
use crate::query::{CmpOp, Filter};

/// Evaluate a filter against one document.
///
/// `guard` is the running operation's registration; a `Where` branch polls
/// its step function in a loop that checks the kill flag and yields between
/// steps, so a predicate that never terminates on its own still unwinds with
/// `OperationKilled` shortly after a kill is requested.
#[async_recursion]
pub async fn matches(filter: &Filter, doc: &Document, guard: &OpGuard) -> Result<bool> {
    match filter {
        Filter::All => Ok(true),
        Filter::Field { path, op, operand } => Ok(field_matches(doc, path, *op, operand)),
        Filter::And(branches) => {
            for branch in branches {
                if !matches(branch, doc, guard).await? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Where(pred) => loop {
            if let Some(verdict) = pred.step(doc) {
                return Ok(verdict);
            }
            guard.checkpoint().await?;
        },
    }
}

fn field_matches(doc: &Document, path: &str, op: CmpOp, operand: &Value) -> bool {
    let mut candidates = Vec::new();
    doc.extract_path(path, &mut candidates);

    match op {
        // $ne holds when no addressed value equals the operand; a missing
        // field therefore satisfies it.
        CmpOp::Ne => !candidates.iter().any(|v| v == operand),
        CmpOp::Eq => candidates.iter().any(|v| v == operand),
        // Ordered comparisons apply only within a type class; a range
        // predicate never matches a value of another class (or a missing
        // field).
        _ => candidates
            .iter()
            .filter(|v| v.same_class(operand))
            .any(|v| ordering_satisfies(op, v.cmp(operand))),
    }
}

fn ordering_satisfies(op: CmpOp, ord: Ordering) -> bool {
    match op {
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Lte => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Gte => ord != Ordering::Less,
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::OpRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(v: serde_json::Value) -> Document {
        Document::from_json(v).unwrap()
    }

    async fn eval(filter: &Filter, d: &Document) -> Result<bool> {
        let registry = Arc::new(OpRegistry::new());
        let guard = registry.register("test.eval", Document::new())?;
        matches(filter, d, &guard).await
    }

    #[tokio::test]
    async fn test_range_comparison() -> Result<()> {
        let lt3 = Filter::field("a", CmpOp::Lt, 3i64);
        assert!(eval(&lt3, &doc(json!({"a": 2}))).await?);
        assert!(!eval(&lt3, &doc(json!({"a": 3}))).await?);
        // Other classes and missing fields never satisfy a range.
        assert!(!eval(&lt3, &doc(json!({"a": "2"}))).await?);
        assert!(!eval(&lt3, &doc(json!({"b": 1}))).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_ne_on_missing_field() -> Result<()> {
        let ne = Filter::field("a", CmpOp::Ne, 3i64);
        assert!(eval(&ne, &doc(json!({}))).await?);
        assert!(eval(&ne, &doc(json!({"a": 4}))).await?);
        assert!(!eval(&ne, &doc(json!({"a": 3}))).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_eq_over_array_elements() -> Result<()> {
        let eq = Filter::field("tags", CmpOp::Eq, "x");
        assert!(eval(&eq, &doc(json!({"tags": ["w", "x"]}))).await?);
        assert!(!eval(&eq, &doc(json!({"tags": ["w"]}))).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_where_step_verdict() -> Result<()> {
        let yes = Filter::where_fn(|_| Some(true));
        assert!(eval(&yes, &doc(json!({}))).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_where_unwinds_on_kill() -> Result<()> {
        let registry = Arc::new(OpRegistry::new());
        let guard = registry.register("test.eval", Document::new())?;
        registry.kill(guard.opid())?;

        let never = Filter::where_fn(|_| None);
        let err = matches(&never, &doc(json!({})), &guard).await.unwrap_err();
        assert!(err.is_killed());
        Ok(())
    }
}
