pub mod admin;
pub mod context;
pub mod count;
pub mod current_op;
pub mod distinct;
pub mod executor;
pub mod kill_op;

pub use context::ExecutionContext;
pub use executor::{CommandExecutor, CommandPipeline};

use crate::core::{DbError, Document, Result, Value};
use crate::query::Filter;

/// Response mode of a distinct scan.
///
/// Derived from the wire `count` field by strict equality against the
/// boolean `true`: any other value (`2`, `"true"`, `false`, absent)
/// falls back to the full values response. Truthiness coercion here would
/// silently activate the count path, which is exactly the bug class the
/// tagged enum prevents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctMode {
    Full,
    CountOnly,
}

impl DistinctMode {
    pub fn from_flag(flag: Option<&Value>) -> Self {
        match flag {
            Some(Value::Boolean(true)) => Self::CountOnly,
            _ => Self::Full,
        }
    }
}

#[derive(Debug)]
pub struct DistinctRequest {
    pub ns: String,
    pub key: String,
    pub filter: Filter,
    pub mode: DistinctMode,
}

#[derive(Debug)]
pub struct CountRequest {
    pub ns: String,
    pub filter: Filter,
}

/// A parsed command document.
#[derive(Debug)]
pub enum Command {
    Distinct(DistinctRequest),
    Count(CountRequest),
    CurrentOp,
    KillOp { opid: u64 },
    Validate { ns: String },
    Drop { ns: String },
}

impl Command {
    /// Parse a wire command document. The first field names the command.
    pub fn parse(doc: &Document) -> Result<Self> {
        let Some((name, value)) = doc.first_field() else {
            return Err(DbError::InvalidArgument("empty command document".into()));
        };

        match name {
            "distinct" => {
                let ns = command_ns(name, value)?;
                let key = match doc.get("key") {
                    Some(Value::Text(k)) => k.clone(),
                    Some(other) => {
                        return Err(DbError::InvalidArgument(format!(
                            "distinct key must be a string, got {}",
                            other.type_name()
                        )));
                    }
                    None => String::new(),
                };
                Ok(Self::Distinct(DistinctRequest {
                    ns,
                    key,
                    filter: parse_query_field(doc)?,
                    mode: DistinctMode::from_flag(doc.get("count")),
                }))
            }
            "count" => Ok(Self::Count(CountRequest {
                ns: command_ns(name, value)?,
                filter: parse_query_field(doc)?,
            })),
            "currentOp" => Ok(Self::CurrentOp),
            "killOp" => {
                let opid = doc
                    .get("op")
                    .and_then(Value::as_i64)
                    .filter(|opid| *opid >= 0)
                    .ok_or_else(|| {
                        DbError::InvalidArgument("killOp requires a numeric 'op' field".into())
                    })?;
                Ok(Self::KillOp { opid: opid as u64 })
            }
            "validate" => Ok(Self::Validate {
                ns: command_ns(name, value)?,
            }),
            "drop" => Ok(Self::Drop {
                ns: command_ns(name, value)?,
            }),
            other => Err(DbError::UnsupportedCommand(other.to_string())),
        }
    }
}

fn command_ns(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Text(ns) if !ns.is_empty() => Ok(ns.clone()),
        _ => Err(DbError::InvalidArgument(format!(
            "{} requires a collection name",
            name
        ))),
    }
}

fn parse_query_field(doc: &Document) -> Result<Filter> {
    match doc.get("query") {
        None => Ok(Filter::All),
        Some(Value::Document(query)) => Filter::parse(query),
        Some(other) => Err(DbError::InvalidArgument(format!(
            "query must be a document, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Result<Command> {
        Command::parse(&Document::from_json(v).unwrap())
    }

    #[test]
    fn test_count_flag_is_strict_boolean_true() {
        for (flag, expected) in [
            (json!(true), DistinctMode::CountOnly),
            (json!(2), DistinctMode::Full),
            (json!("true"), DistinctMode::Full),
            (json!(false), DistinctMode::Full),
            (json!(null), DistinctMode::Full),
        ] {
            let cmd = parse(json!({"distinct": "t", "key": "a", "count": flag})).unwrap();
            match cmd {
                Command::Distinct(req) => assert_eq!(req.mode, expected),
                other => panic!("expected distinct, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            parse(json!({"mapReduce": "t"})),
            Err(DbError::UnsupportedCommand(_))
        ));
    }

    #[test]
    fn test_killop_requires_numeric_opid() {
        assert!(matches!(
            parse(json!({"killOp": 1, "op": "abc"})),
            Err(DbError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse(json!({"killOp": 1, "op": 7})).unwrap(),
            Command::KillOp { opid: 7 }
        ));
    }
}
