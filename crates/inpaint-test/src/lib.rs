//! inpaint-test - Regression test framework for the inpaint crates
//!
//! Provides [`RegParams`] with three modes:
//!
//! - **Generate**: Create golden files for comparison
//! - **Compare**: Compare results with golden files
//! - **Display**: Run tests without comparison (visual inspection)
//!
//! and seeded generators for random frames and masks.
//!
//! # Usage
//!
//! ```ignore
//! use inpaint_test::RegParams;
//!
//! let mut rp = RegParams::new("shrinker");
//! rp.compare_values(4.0, layers as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "generate", "compare", or "display"
//! - `RUST_LOG`: Log filter for the test logger

mod error;
mod params;
pub mod random;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};
pub use random::{random_frame, random_hole_mask, random_mask, seeded_rng};

use std::sync::Once;

static LOGGER: Once = Once::new();

/// Install `env_logger` for tests once per process
pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // inpaint-test is at crates/inpaint-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
