//! Shared test infrastructure for strip-runner integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use strip_runner::StripTransport;

// ============================================================================
// Recording Transport
// ============================================================================

/// Transport that records every rendered frame for later inspection.
///
/// Clones share the frame log, so tests keep one handle while the runner
/// owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames written so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.lock().unwrap().last().cloned()
    }
}

impl StripTransport for MockTransport {
    type Error = Infallible;

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.frames.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

// ============================================================================
// Failing Transport
// ============================================================================

#[derive(Debug)]
pub struct BusError;

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus disconnected")
    }
}

impl std::error::Error for BusError {}

/// Transport whose every write fails, for error-path tests.
pub struct FailingTransport;

impl StripTransport for FailingTransport {
    type Error = BusError;

    fn write_frame(&mut self, _bytes: &[u8]) -> Result<(), BusError> {
        Err(BusError)
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Polls `cond` until it holds or `timeout` expires; returns the final
/// evaluation. Worker threads run at their own pace, so assertions on
/// their side effects go through this.
pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Generous bound for "the worker should get there well before this".
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
