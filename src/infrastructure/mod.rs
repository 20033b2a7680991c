pub mod error;
pub mod logging;
pub mod network;

pub use error::{ErrorKind, ReviewError, GENERIC_FAILURE_MESSAGE};
pub use logging::{setup_logging, LogFormat, LogOutput, LoggingConfig};
pub use network::{build_client, NetworkConfig};
