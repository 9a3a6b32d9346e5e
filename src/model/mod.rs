//! 领域模型

pub mod candidate;
pub mod search;
pub mod user;

pub use candidate::{filter_candidates, Candidate};
pub use search::SearchParams;
pub use user::{NewUser, User};
