#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! A raw MPEG audio file is a run of frames with metadata blocks bracketing
//! it. There is no container index, so the only way to find the audio is to
//! measure the tag blocks at both ends and then synchronize on a frame header.
//!
//! ### Open Sequence
//!
//! 1. Measure head and tail tag regions ([`process::regions`]); the gap
//!    between them is the [`MediaSpan`](process::MediaSpan).
//! 2. Establish the start: locate the first frame header within
//!    [`SCAN_WINDOW`](process::SCAN_WINDOW) bytes of the span start
//!    ([`process::locate`]).
//! 3. Establish the end: create missing ID3 tags as the
//!    [`TagCreationPolicy`](structs::policy::TagCreationPolicy) asks.
//! 4. Derive [`Properties`](structs::properties::Properties) from the first
//!    header and the span.
//!
//! Steps 2 to 4 are the [`BoundaryHooks`](process::boundary::BoundaryHooks)
//! driven by [`MpegFile`](process::file::MpegFile).
//!
//! ### Tag Anchors
//!
//! ID3v2 tags belong at the head of the file, ID3v1 and APE tags at the tail.
//! Other tag families have no place in a raw MPEG stream and are never
//! created.

/// Opening raw MPEG streams.
///
/// - **Header Search** ([`process::locate`]): bounded frame synchronization
/// - **Tag Regions** ([`process::regions`]): head/tail tag block measurement
/// - **Lifecycle Hooks** ([`process::boundary`]): start, end and properties
/// - **File Engine** ([`process::file`]): the open sequence and tag access
pub mod process;

/// Data structures for stream boundaries.
///
/// - **Frame Headers** ([`structs::header`]): 32-bit MPEG audio header
/// - **Tags** ([`structs::tag`]): tag kinds, anchors and containers
/// - **Policy** ([`structs::policy`]): tag creation switches
/// - **Properties** ([`structs::properties`]): derived stream properties
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): bit-level reading
/// - **Error Handling** ([`utils::errors`]): error types
pub mod utils;
