//! Unit tests for the efsml CLI
//!
//! These tests use in-memory ports and run fast without external I/O.

mod architecture;
mod mocks;
mod property_tests;
