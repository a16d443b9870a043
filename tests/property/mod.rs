//! Property-based tests for shared types

pub mod key_proptest;
pub mod member_set_proptest;
