pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod positions;
pub mod scraper;
pub mod session;
pub mod store;
pub mod utils;
pub mod wait;

pub use config::AppConfig;
pub use error::ScrapeError;
pub use pipeline::{Pipeline, RunSummary};
pub use store::Store;
