//! sfkit integration test support
//!
//! Shared helpers for building fixture trees, snapshotting them and recording
//! progress events. The workspace-level scenarios live in
//! `tests/integration_tests.rs`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Fixture builders and assertions shared by all integration tests.
pub mod test_utils;
