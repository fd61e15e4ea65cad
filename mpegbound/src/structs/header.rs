//! MPEG audio frame header.
//!
//! ## Header Layout
//!
//! Every frame starts with a 32-bit big-endian word:
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A sync (11 bits, all set)    B version       C layer        D protection
//! E bitrate index              F sample rate   G padding      H private
//! I channel mode               J mode ext      K copyright    L original
//! M emphasis
//! ```
//!
//! Reserved values of version, layer, bitrate index, sample rate index and
//! emphasis make the word invalid, which keeps false syncs inside audio data
//! or tag padding from being accepted.

use std::fmt::{Display, Formatter};

use anyhow::{Result, bail, ensure};
use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// Size of the fixed header word in bytes.
pub const HEADER_SIZE: usize = 4;

/// 11-bit frame sync pattern.
pub const FRAME_SYNC: u16 = 0x7FF;

const SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

// Indexed by bitrate index 1..=14, index 0 is free format.
const BITRATES_V1: [[u16; 14]; 3] = [
    [32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

const BITRATES_V2: [[u16; 14]; 2] = [
    [32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

impl MpegVersion {
    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0b11 => Self::V1,
            0b10 => Self::V2,
            0b00 => Self::V2_5,
            _ => bail!(HeaderError::ReservedVersion),
        })
    }

    fn table_index(self) -> usize {
        match self {
            Self::V1 => 0,
            Self::V2 => 1,
            Self::V2_5 => 2,
        }
    }
}

impl Display for MpegVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "MPEG-1"),
            Self::V2 => write!(f, "MPEG-2"),
            Self::V2_5 => write!(f, "MPEG-2.5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    I,
    II,
    III,
}

impl Layer {
    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0b11 => Self::I,
            0b10 => Self::II,
            0b01 => Self::III,
            _ => bail!(HeaderError::ReservedLayer),
        })
    }

    fn table_index(self) -> usize {
        match self {
            Self::I => 0,
            Self::II => 1,
            Self::III => 2,
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I => write!(f, "Layer I"),
            Self::II => write!(f, "Layer II"),
            Self::III => write!(f, "Layer III"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    SingleChannel,
}

impl From<u8> for ChannelMode {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Stereo,
            0b01 => Self::JointStereo,
            0b10 => Self::DualChannel,
            _ => Self::SingleChannel,
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stereo => write!(f, "Stereo"),
            Self::JointStereo => write!(f, "Joint stereo"),
            Self::DualChannel => write!(f, "Dual channel"),
            Self::SingleChannel => write!(f, "Single channel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    FiftyFifteen,
    CcittJ17,
}

/// A validated MPEG audio frame header and its absolute position.
///
/// The stream length is unset when the header is parsed. It is bound once per
/// open session, after the media span between the tag regions is known, and
/// is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub offset: u64,
    pub version: MpegVersion,
    pub layer: Layer,
    pub protected: bool,
    pub bitrate_index: u8,
    pub sample_rate_index: u8,
    pub padding: bool,
    pub private: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: Emphasis,
    stream_length: Option<u64>,
}

impl FrameHeader {
    /// Parses the 4-byte header word found at `offset`.
    ///
    /// Fails with a [`HeaderError`] when the word is not a syntactically valid
    /// header. Bytes past the first four are ignored.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        ensure!(
            data.len() >= HEADER_SIZE,
            HeaderError::InsufficientData(data.len())
        );

        let reader = &mut BsIoSliceReader::from_slice(&data[..HEADER_SIZE]);

        let sync: u16 = reader.get_n(11)?;
        if sync != FRAME_SYNC {
            bail!(HeaderError::InvalidSync(sync));
        }

        let version = MpegVersion::from_bits(reader.get_n(2)?)?;
        let layer = Layer::from_bits(reader.get_n(2)?)?;
        // Protection bit is set when no CRC follows.
        let protected = !reader.get()?;

        let bitrate_index: u8 = reader.get_n(4)?;
        if bitrate_index == 0xF {
            bail!(HeaderError::InvalidBitrateIndex(bitrate_index));
        }

        let sample_rate_index: u8 = reader.get_n(2)?;
        if sample_rate_index == 0b11 {
            bail!(HeaderError::ReservedSampleRate);
        }

        let padding = reader.get()?;
        let private = reader.get()?;
        let channel_mode = ChannelMode::from(reader.get_n::<u8>(2)?);
        let mode_extension = reader.get_n(2)?;
        let copyright = reader.get()?;
        let original = reader.get()?;
        let emphasis = match reader.get_n::<u8>(2)? {
            0b00 => Emphasis::None,
            0b01 => Emphasis::FiftyFifteen,
            0b11 => Emphasis::CcittJ17,
            _ => bail!(HeaderError::ReservedEmphasis),
        };

        let header = Self {
            offset,
            version,
            layer,
            protected,
            bitrate_index,
            sample_rate_index,
            padding,
            private,
            channel_mode,
            mode_extension,
            copyright,
            original,
            emphasis,
            stream_length: None,
        };

        trace!("Frame header at {offset}: {header}");

        Ok(header)
    }

    /// Cheap pre-filter on the first two bytes before a full parse.
    #[inline(always)]
    pub fn is_sync_candidate(b0: u8, b1: u8) -> bool {
        b0 == 0xFF && b1 & 0xE0 == 0xE0
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.version.table_index()][self.sample_rate_index as usize]
    }

    /// Bitrate in kbit/s, `None` for free format streams.
    pub fn bitrate(&self) -> Option<u16> {
        if self.bitrate_index == 0 {
            return None;
        }

        let index = self.bitrate_index as usize - 1;
        Some(match self.version {
            MpegVersion::V1 => BITRATES_V1[self.layer.table_index()][index],
            MpegVersion::V2 | MpegVersion::V2_5 => match self.layer {
                Layer::I => BITRATES_V2[0][index],
                Layer::II | Layer::III => BITRATES_V2[1][index],
            },
        })
    }

    pub fn channels(&self) -> u8 {
        match self.channel_mode {
            ChannelMode::SingleChannel => 1,
            _ => 2,
        }
    }

    /// Binds the number of audio bytes in the stream.
    ///
    /// One binding per open session. Rebinding with a different length is a
    /// caller bug.
    pub fn bind_stream_length(&mut self, length: u64) {
        debug_assert!(
            self.stream_length.is_none_or(|bound| bound == length),
            "frame header already bound to {:?} bytes, rebinding to {length}",
            self.stream_length
        );

        self.stream_length = Some(length);
    }

    /// Total bytes of media, once bound.
    pub fn stream_length(&self) -> Option<u64> {
        self.stream_length
    }
}

impl Display for FrameHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}, {} Hz, {}, ",
            self.version,
            self.layer,
            self.sample_rate(),
            self.channel_mode
        )?;

        match self.bitrate() {
            Some(kbps) => write!(f, "{kbps} kbps"),
            None => write!(f, "free format"),
        }
    }
}
