#![deny(missing_docs)]
#![doc = "Shared error taxonomy, deterministic RNG and logging setup for the gwn crates."]

pub mod errors;
pub mod logging;
pub mod rng;

pub use errors::{ErrorInfo, NestError};
pub use logging::setup_logger;
pub use rng::{derive_substream_seed, RngHandle};
