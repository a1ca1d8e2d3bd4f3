//! Unit tests for the board module.

mod support;

mod lifecycle_tests;
