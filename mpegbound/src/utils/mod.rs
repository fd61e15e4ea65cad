//! Utility functions and supporting infrastructure.
//!
//! Provides bit-level reading for frame headers and the error types shared
//! by the locator, the tag region reader and the boundary hooks.

pub mod bitstream_io;
pub mod errors;
