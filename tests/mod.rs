//! Test suite for the favorites sync library
//!
//! This module organizes all tests

pub mod common;
pub mod property;
