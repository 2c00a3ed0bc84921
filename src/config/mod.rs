//! Configuration models and loaders.

pub mod lot;

pub use lot::{
    LotConfig, ENV_ENTRY_COUNT, ENV_EXIT_COUNT, ENV_MAX_SLOT, ENV_SHUTDOWN_TIMEOUT_SECS,
    ENV_SINK_TIMEOUT_MS,
};
