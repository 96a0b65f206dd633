//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    let _ = env_logger::builder().is_test(false).try_init();
}
