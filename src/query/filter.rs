use std::fmt;
use std::sync::Arc;

use crate::core::{DbError, Document, Result, Value};

/// Comparison operators accepted in filter documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "$eq" => Some(Self::Eq),
            "$ne" => Some(Self::Ne),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            _ => None,
        }
    }

    pub fn as_operator(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
        }
    }
}

/// A user predicate evaluated one bounded step at a time.
///
/// `step` must do a bounded amount of work and is re-invoked until it
/// returns a verdict; the evaluator checks the operation's kill flag and
/// yields between steps, which is what keeps an arbitrarily long predicate
/// cancellable. A predicate that never returns `Some` runs until killed.
pub trait WherePredicate: Send + Sync {
    fn step(&self, doc: &Document) -> Option<bool>;
}

impl<F> WherePredicate for F
where
    F: Fn(&Document) -> Option<bool> + Send + Sync,
{
    fn step(&self, doc: &Document) -> Option<bool> {
        self(doc)
    }
}

/// A predicate over documents.
#[derive(Clone)]
pub enum Filter {
    /// Matches every document.
    All,
    /// A single field comparison over a dotted path.
    Field {
        path: String,
        op: CmpOp,
        operand: Value,
    },
    /// Conjunction; matches when every branch matches.
    And(Vec<Filter>),
    /// User predicate. Reachable only through the typed API; the wire parser
    /// rejects `$where`.
    Where(Arc<dyn WherePredicate>),
}

impl Filter {
    pub fn field(path: impl Into<String>, op: CmpOp, operand: impl Into<Value>) -> Self {
        Self::Field {
            path: path.into(),
            op,
            operand: operand.into(),
        }
    }

    pub fn where_(pred: Arc<dyn WherePredicate>) -> Self {
        Self::Where(pred)
    }

    pub fn where_fn<F>(pred: F) -> Self
    where
        F: Fn(&Document) -> Option<bool> + Send + Sync + 'static,
    {
        Self::Where(Arc::new(pred))
    }

    /// True when evaluation can run for an unbounded time (contains a user
    /// predicate).
    pub fn is_unbounded(&self) -> bool {
        match self {
            Self::Where(_) => true,
            Self::And(branches) => branches.iter().any(Filter::is_unbounded),
            _ => false,
        }
    }

    /// Parse a wire filter document.
    ///
    /// `{}` matches all; `{a: v}` is equality; `{a: {"$lt": v}}` and friends
    /// are comparisons; several top-level fields conjoin. Unknown `$`
    /// operators (including `$where`, which carries host code and cannot
    /// cross the wire) are `InvalidArgument`.
    pub fn parse(doc: &Document) -> Result<Self> {
        let mut branches = Vec::new();
        for (name, value) in doc.iter() {
            if name.starts_with('$') {
                return Err(DbError::InvalidArgument(format!(
                    "unsupported top-level operator: {}",
                    name
                )));
            }
            match value {
                Value::Document(spec) if is_operator_document(spec) => {
                    for (op_name, operand) in spec.iter() {
                        let op = CmpOp::from_operator(op_name).ok_or_else(|| {
                            DbError::InvalidArgument(format!(
                                "unknown filter operator: {}",
                                op_name
                            ))
                        })?;
                        branches.push(Filter::field(name, op, operand.clone()));
                    }
                }
                other => branches.push(Filter::field(name, CmpOp::Eq, other.clone())),
            }
        }
        Ok(match branches.len() {
            0 => Self::All,
            1 => branches.into_iter().next().unwrap_or(Self::All),
            _ => Self::And(branches),
        })
    }

    /// Document rendering of the filter, recorded in the operation registry
    /// so `currentOp` shows what a running command is matching on.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        self.render_into(&mut doc);
        doc
    }

    fn render_into(&self, doc: &mut Document) {
        match self {
            Self::All => {}
            Self::Field { path, op, operand } => {
                let mut spec = Document::new();
                spec.insert(op.as_operator(), operand.clone());
                doc.insert(path.as_str(), Value::Document(spec));
            }
            Self::And(branches) => {
                for branch in branches {
                    branch.render_into(doc);
                }
            }
            Self::Where(_) => {
                doc.insert("$where", "<native predicate>");
            }
        }
    }
}

fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.iter().all(|(name, _)| name.starts_with('$'))
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Field { path, op, operand } => f
                .debug_struct("Field")
                .field("path", path)
                .field("op", op)
                .field("operand", operand)
                .finish(),
            Self::And(branches) => f.debug_tuple("And").field(branches).finish(),
            Self::Where(_) => write!(f, "Where(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Result<Filter> {
        Filter::parse(&Document::from_json(v).unwrap())
    }

    #[test]
    fn test_parse_shapes() {
        assert!(matches!(parse(json!({})).unwrap(), Filter::All));
        assert!(matches!(
            parse(json!({"a": 3})).unwrap(),
            Filter::Field { op: CmpOp::Eq, .. }
        ));
        assert!(matches!(
            parse(json!({"a": {"$lt": 3}})).unwrap(),
            Filter::Field { op: CmpOp::Lt, .. }
        ));
        assert!(matches!(
            parse(json!({"a": 1, "b": {"$gte": 2}})).unwrap(),
            Filter::And(_)
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_operators() {
        assert!(parse(json!({"a": {"$regex": "x"}})).is_err());
        assert!(parse(json!({"$where": "while(1){}"})).is_err());
    }

    #[test]
    fn test_equality_on_operand_document_without_operators() {
        // {a: {b: 1}} is a literal equality match, not an operator document.
        assert!(matches!(
            parse(json!({"a": {"b": 1}})).unwrap(),
            Filter::Field { op: CmpOp::Eq, .. }
        ));
    }

    #[test]
    fn test_unbounded_detection() {
        assert!(!parse(json!({"a": 1})).unwrap().is_unbounded());
        assert!(Filter::where_fn(|_| None).is_unbounded());
        assert!(
            Filter::And(vec![Filter::All, Filter::where_fn(|_| Some(true))]).is_unbounded()
        );
    }
}
