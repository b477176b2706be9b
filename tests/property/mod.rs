//! Property-based tests

pub mod queue_proptest;
pub mod toggle_proptest;
