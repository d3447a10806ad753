pub mod collection;
pub mod store;

pub use collection::Collection;
pub use store::Store;
