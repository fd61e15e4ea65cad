use crate::structs::tag::TagKind;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("MPEG audio header not found within {window} bytes of offset {start}")]
    CorruptFile { start: u64, window: u64 },

    #[error("Audio properties unavailable: no frame header was established")]
    PropertiesUnavailable,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Tag creation switches disagree: create_id3v1 = {id3v1}, create_id3v2 = {id3v2}")]
    Inconsistent { id3v1: bool, id3v2: bool },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid frame sync: {0:#05X}")]
    InvalidSync(u16),

    #[error("Reserved MPEG version id")]
    ReservedVersion,

    #[error("Reserved layer description")]
    ReservedLayer,

    #[error("Invalid bitrate index: {0}")]
    InvalidBitrateIndex(u8),

    #[error("Reserved sample rate index")]
    ReservedSampleRate,

    #[error("Reserved emphasis value")]
    ReservedEmphasis,

    #[error("Insufficient data for frame header: {0} bytes")]
    InsufficientData(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("{kind} tag at offset {offset} claims {size} bytes, exceeding the available {available}")]
    Overflow {
        kind: TagKind,
        offset: u64,
        size: u64,
        available: u64,
    },

    #[error("{kind} tag at offset {offset} has a malformed size field")]
    MalformedSize { kind: TagKind, offset: u64 },
}
