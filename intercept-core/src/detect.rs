//! Best-effort test harness detection.
//!
//! Resolves a test identity for the test-name header when the caller has not
//! set one explicitly. Detection is a lookup over environment markers and the
//! current thread; it never fails, unknown environments simply yield `None`.

use lazy_static::lazy_static;
use std::sync::Mutex;

/// Harness driving the current test process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestHarness {
    /// cargo test (libtest)
    Cargo,
    /// cargo-nextest runner
    Nextest,
}

lazy_static! {
    static ref HARNESS_OVERRIDE: Mutex<Option<TestHarness>> = Mutex::new(None);
    static ref TEST_NAME_OVERRIDE: Mutex<Option<String>> = Mutex::new(None);
}

/// Explicitly select the harness when it is known ahead of time.
pub fn set_harness(harness: Option<TestHarness>) {
    *HARNESS_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = harness;
}

/// Explicitly set the test identity; takes precedence over detection.
pub fn set_test_name(name: Option<&str>) {
    *TEST_NAME_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = name.map(str::to_string);
}

/// Harness detected for this process, if any.
pub fn harness() -> Option<TestHarness> {
    if let Some(harness) = *HARNESS_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) {
        return Some(harness);
    }

    // nextest exports its own marker variables into every test process.
    if std::env::var_os("NEXTEST").is_some() || std::env::var_os("NEXTEST_EXECUTION_MODE").is_some()
    {
        return Some(TestHarness::Nextest);
    }

    // cargo passes CARGO into the environment of binaries it runs.
    if std::env::var_os("CARGO").is_some() {
        return Some(TestHarness::Cargo);
    }

    None
}

/// Test identity for the current request, if one can be resolved.
///
/// libtest names each test thread after the test path, and nextest drives
/// libtest binaries, so the thread name covers both harnesses. Runtime worker
/// threads and the main thread carry no usable identity.
pub fn test_name() -> Option<String> {
    if let Some(name) = TEST_NAME_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    {
        return Some(name);
    }

    harness()?;

    let thread = std::thread::current();
    let name = thread.name()?;
    if name == "main" || name.starts_with("tokio-runtime") {
        return None;
    }

    Some(name.to_string())
}
