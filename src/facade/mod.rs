pub mod database;

pub use database::Db;
