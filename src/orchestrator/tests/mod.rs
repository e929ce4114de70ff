//! Unit tests for the orchestration facade.

mod facade_tests;
