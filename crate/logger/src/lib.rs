//! Logging bootstrap for the wxpay crates.
//!
//! Library code only emits events through the re-exported `tracing` macros;
//! binaries and tests decide whether and how they are printed with [`log_init`].

pub use log_utils::{LogFormat, log_init, log_init_with_format};
pub use tracing::{debug, info, trace, warn};

mod log_utils;
