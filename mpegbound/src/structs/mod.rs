//! Data structures for stream boundaries.
//!
//! Frame headers, tag kinds with their anchors, the tag creation policy and
//! the properties value produced when a file is opened.

pub mod header;
pub mod policy;
pub mod properties;
pub mod tag;
