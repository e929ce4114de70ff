//! Unit tests for the intake bounded context.
