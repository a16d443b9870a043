//! Test suite for Teamspace
//!
//! This module organizes all tests

pub mod common;
pub mod property;
