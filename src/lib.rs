// Core modules
pub mod cli;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod review;

pub use infrastructure::error::{ErrorKind, ReviewError};
pub use review::{RequestController, RequestState, ReviewResult, ReviewService, SourceKind};
