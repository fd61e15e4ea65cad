use std::fmt::Display;

use crate::structs::policy::TagCreationPolicy;

/// Bounded search for the first frame header.
///
/// Provides the [`HeaderLocator`](locate::HeaderLocator) seam and the
/// [`StreamLocator`](locate::StreamLocator) that scans a seekable reader.
pub mod locate;

/// Detection of tag blocks bracketing the audio frames.
///
/// Provides the [`RegionReader`](regions::RegionReader) that measures the
/// head and tail tag regions and yields the [`MediaSpan`] between them.
pub mod regions;

/// Lifecycle hooks invoked while a file is opened.
///
/// Provides the [`BoundaryHooks`](boundary::BoundaryHooks) trait and its MPEG
/// implementation [`MpegBoundary`](boundary::MpegBoundary).
pub mod boundary;

/// The file engine driving the open sequence.
///
/// Provides [`MpegFile`](file::MpegFile).
pub mod file;

/// Maximum number of candidate offsets examined for the first frame header,
/// counted from the end of the head tag region.
pub const SCAN_WINDOW: u64 = 0x4000;

/// How much of the stream to inspect when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStyle {
    /// Tags only.
    None,
    /// Tags only, properties requested but not validated.
    Fast,
    /// Locate the first frame header and derive properties.
    #[default]
    Average,
    /// Same as [`ReadStyle::Average`] at this layer.
    Accurate,
}

impl ReadStyle {
    /// Whether the first frame header is searched for.
    pub fn inspects_stream(self) -> bool {
        matches!(self, ReadStyle::Average | ReadStyle::Accurate)
    }
}

impl Display for ReadStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadStyle::None => write!(f, "none"),
            ReadStyle::Fast => write!(f, "fast"),
            ReadStyle::Average => write!(f, "average"),
            ReadStyle::Accurate => write!(f, "accurate"),
        }
    }
}

/// Half-open byte range `[start, end)` of audio frames between the tag
/// regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaSpan {
    start: u64,
    end: u64,
}

impl MediaSpan {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Per-open configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read_style: ReadStyle,
    pub policy: TagCreationPolicy,
    /// Region problems at or above this severity fail the open instead of
    /// being logged.
    pub fail_level: log::Level,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_style: ReadStyle::default(),
            policy: TagCreationPolicy::default(),
            fail_level: log::Level::Error,
        }
    }
}

#[test]
fn read_style_inspection() {
    assert!(!ReadStyle::None.inspects_stream());
    assert!(!ReadStyle::Fast.inspects_stream());
    assert!(ReadStyle::Average.inspects_stream());
    assert!(ReadStyle::Accurate.inspects_stream());
}

#[test]
fn media_span_never_inverts() {
    let span = MediaSpan::new(1000, 5000);
    assert_eq!(span.len(), 4000);

    let span = MediaSpan::new(700, 300);
    assert_eq!((span.start(), span.end()), (700, 700));
    assert!(span.is_empty());
}
