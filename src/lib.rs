pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod model;
pub mod net;
pub mod storage;

pub use cache::CacheState;
pub use client::TrackerClient;
pub use config::{ClientConfig, ConfigError};
pub use errors::TrackerError;
pub use model::{AnonymousId, Event, JsonObject, ReportRecord, Session};
