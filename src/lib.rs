mod api;
pub mod app;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod filter;
pub mod model;
pub mod report;
pub mod session;
pub mod stats;
mod utils;

pub use api::{ApiError, Mode, TEST_MODE_ENV};
pub use app::App;
pub use config::Config;
pub use error::Error;
pub use error::Result;
