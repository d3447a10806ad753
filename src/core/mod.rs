pub mod document;
pub mod error;
pub mod value;

pub use document::Document;
pub use error::{DbError, Result};
pub use value::Value;
