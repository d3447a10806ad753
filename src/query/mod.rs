pub mod eval;
pub mod filter;

pub use eval::matches;
pub use filter::{CmpOp, Filter, WherePredicate};
