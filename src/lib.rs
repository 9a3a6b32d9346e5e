pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod infra;
pub mod logging;
pub mod model;
pub mod repository;
pub mod server;
pub mod session;
pub mod vk;

pub use config::BotConfig;
pub use dispatcher::{classify, Action, ActionPayload, Command, Dispatcher};
pub use error::{BotError, Result};
pub use server::MatchBot;
pub use session::{BrowseSession, SessionStore};
