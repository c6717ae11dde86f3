//! Common utilities shared across the container reader and the Word parsers.

pub mod binary;

pub use binary::{BinaryError, BinaryResult};
