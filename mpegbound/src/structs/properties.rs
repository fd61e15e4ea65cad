//! Stream-level audio properties.

use std::time::Duration;

use crate::structs::header::{ChannelMode, FrameHeader, Layer, MpegVersion};

/// Properties derived once per open from the first frame header and the
/// media span.
///
/// A zero duration hint means the duration was not computed at open time and
/// is left to whoever reads the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Properties {
    duration_hint: Duration,
    header: FrameHeader,
}

impl Properties {
    pub fn new(duration_hint: Duration, header: FrameHeader) -> Self {
        Self {
            duration_hint,
            header,
        }
    }

    pub fn duration_hint(&self) -> Duration {
        self.duration_hint
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn version(&self) -> MpegVersion {
        self.header.version
    }

    pub fn layer(&self) -> Layer {
        self.header.layer
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate()
    }

    pub fn bitrate(&self) -> Option<u16> {
        self.header.bitrate()
    }

    pub fn channels(&self) -> u8 {
        self.header.channels()
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.header.channel_mode
    }

    /// Bytes of audio between the tag regions.
    pub fn stream_length(&self) -> Option<u64> {
        self.header.stream_length()
    }
}
