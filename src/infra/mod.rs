//! 基础设施

pub mod database;

pub use database::Database;
