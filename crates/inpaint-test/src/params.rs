//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::{golden_dir, regout_dir};
use inpaint_core::{Element, Frame, FrameView};
use std::fs;
use std::path::Path;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Generate golden files
    Generate,
    /// Compare with golden files (default)
    #[default]
    Compare,
    /// Display mode - run without comparison
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "generate" => Self::Generate,
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, the index of the current check, the mode and
/// every failure recorded so far.
pub struct RegParams {
    /// Name of the test (e.g., "shrinker")
    pub test_name: String,
    /// Current check index (incremented before each check)
    index: usize,
    /// Test mode (generate, compare, or display)
    pub mode: RegTestMode,
    success: bool,
    failures: Vec<String>,
}

impl RegParams {
    /// Create regression test parameters for `test_name`.
    ///
    /// Installs the test logger and creates the golden and output
    /// directories.
    pub fn new(test_name: &str) -> Self {
        crate::init_logging();
        let mode = RegTestMode::from_env();

        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());

        log::info!("{}_reg started in {:?} mode", test_name, mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, message: String) {
        log::error!("{}", message);
        self.failures.push(message);
        self.success = false;
    }

    /// Compare two values, allowing a difference of `delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            self.fail(format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            ));
            false
        } else {
            true
        }
    }

    /// Compare two frames for identical layout and pixel content.
    ///
    /// Padding elements are ignored.
    pub fn compare_frames<T: Element>(
        &mut self,
        expected: FrameView<'_, T>,
        actual: FrameView<'_, T>,
    ) -> bool {
        self.index += 1;

        if !expected.same_grid(&actual) || expected.channels() != actual.channels() {
            self.fail(format!(
                "Failure in {}_reg: frame comparison for index {} - layout mismatch \
                 {}x{}x{} vs {}x{}x{}",
                self.test_name,
                self.index,
                expected.width(),
                expected.height(),
                expected.channels(),
                actual.width(),
                actual.height(),
                actual.channels()
            ));
            return false;
        }

        for y in 0..expected.height() {
            for x in 0..expected.width() {
                if expected.pixel(x, y) != actual.pixel(x, y) {
                    self.fail(format!(
                        "Failure in {}_reg: frame comparison for index {} - pixel mismatch \
                         at ({}, {}): {:?} vs {:?}",
                        self.test_name,
                        self.index,
                        x,
                        y,
                        expected.pixel(x, y),
                        actual.pixel(x, y)
                    ));
                    return false;
                }
            }
        }

        true
    }

    /// Compare two frames element-wise, allowing a difference of `delta`.
    pub fn compare_frames_within(
        &mut self,
        expected: FrameView<'_, u8>,
        actual: FrameView<'_, u8>,
        delta: u8,
    ) -> bool {
        if !expected.same_grid(&actual) || expected.channels() != actual.channels() {
            return self.compare_frames(expected, actual);
        }
        self.index += 1;

        for y in 0..expected.height() {
            let worst = expected
                .row(y)
                .iter()
                .zip(actual.row(y))
                .map(|(&e, &a)| e.abs_diff(a))
                .max()
                .unwrap_or(0);
            if worst > delta {
                self.fail(format!(
                    "Failure in {}_reg: frame comparison for index {} - row {} differs \
                     by {} but allowed delta = {}",
                    self.test_name, self.index, y, worst, delta
                ));
                return false;
            }
        }
        true
    }

    /// Compare two byte arrays
    pub fn compare_data(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.index += 1;

        if data1 != data2 {
            self.fail(format!(
                "Failure in {}_reg: data comparison for index {}\n\
                 sizes: {} vs {}",
                self.test_name,
                self.index,
                data1.len(),
                data2.len()
            ));
            false
        } else {
            true
        }
    }

    /// Write an 8-bit frame as PNG and check it against its golden file
    pub fn write_frame_and_check(&mut self, frame: FrameView<'_, u8>) -> TestResult<()> {
        self.index += 1;

        let local_path = format!("{}/{}.{:02}.png", regout_dir(), self.test_name, self.index);
        inpaint_io::write_png_file(frame, &local_path).map_err(|e| TestError::FrameWrite {
            path: local_path.clone(),
            message: e.to_string(),
        })?;

        self.check_file(&local_path)
    }

    /// Check a file against its golden counterpart
    ///
    /// Generate mode copies the file to the golden directory. Compare mode
    /// compares decoded pixels and skips files without a golden copy.
    fn check_file(&mut self, local_path: &str) -> TestResult<()> {
        let golden_path = format!(
            "{}/{}_golden.{:02}.png",
            golden_dir(),
            self.test_name,
            self.index
        );

        match self.mode {
            RegTestMode::Generate => {
                fs::copy(local_path, &golden_path)?;
                log::info!("Generated: {}", golden_path);
            }
            RegTestMode::Compare => {
                if !Path::new(&golden_path).exists() {
                    log::warn!("golden file not found, skipping: {}", golden_path);
                    return Ok(());
                }

                let local = read_frame(local_path)?;
                let golden = read_frame(&golden_path)?;
                if local != golden {
                    self.fail(format!(
                        "Failure in {}_reg, index {}: comparing {} with {}",
                        self.test_name, self.index, local_path, golden_path
                    ));
                }
            }
            RegTestMode::Display => {}
        }

        Ok(())
    }

    /// Report results and consume the parameters
    ///
    /// Returns `true` if every check passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            log::info!("SUCCESS: {}_reg", self.test_name);
        } else {
            log::error!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                log::error!("  {}", failure);
            }
        }

        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

fn read_frame(path: &str) -> TestResult<Frame<u8>> {
    inpaint_io::read_png_file(path).map_err(|e| TestError::FrameRead {
        path: path.to_string(),
        message: e.to_string(),
    })
}
