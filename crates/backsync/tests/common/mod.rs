//! Shared test utilities for backsync integration tests.
//!
//! - `TestHarness` owns a temp directory with a fake `rsync` script
//! - `RecordingNotifier` captures messages instead of posting them

pub mod harness;

pub use harness::{RecordingNotifier, TestHarness};
