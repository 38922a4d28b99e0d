//! Unit tests for the marketplace task module.

mod lifecycle_tests;
mod support;
