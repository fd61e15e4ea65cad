use std::io::{Read, Seek, SeekFrom};

use anyhow::Result;
use log::{debug, trace};

use crate::structs::header::{FrameHeader, HEADER_SIZE};

/// Finds the first valid frame header within a bounded window.
pub trait HeaderLocator {
    /// Examines candidate offsets in `[start, start + window)` and returns
    /// the first one holding a valid header, or `None`.
    ///
    /// Implementations must not read further than `window` bytes plus the
    /// tail of a header starting at the last candidate, whatever the size of
    /// the underlying stream.
    fn locate(&mut self, start: u64, window: u64) -> Result<Option<FrameHeader>>;
}

impl<L: HeaderLocator + ?Sized> HeaderLocator for &mut L {
    fn locate(&mut self, start: u64, window: u64) -> Result<Option<FrameHeader>> {
        (**self).locate(start, window)
    }
}

/// [`HeaderLocator`] over a seekable byte stream.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mpegbound::process::SCAN_WINDOW;
/// use mpegbound::process::locate::{HeaderLocator, StreamLocator};
///
/// let mut data = vec![0u8; 100];
/// data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
///
/// let mut locator = StreamLocator::new(Cursor::new(data));
/// let header = locator.locate(0, SCAN_WINDOW)?.expect("header");
/// assert_eq!(header.offset, 100);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct StreamLocator<R> {
    reader: R,
}

impl<R: Read + Seek> StreamLocator<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> HeaderLocator for StreamLocator<R> {
    fn locate(&mut self, start: u64, window: u64) -> Result<Option<FrameHeader>> {
        let stream_len = self.reader.seek(SeekFrom::End(0))?;
        if start >= stream_len || window == 0 {
            return Ok(None);
        }

        let available = stream_len - start;
        let candidates = window.min(available);
        let read_len = candidates
            .saturating_add(HEADER_SIZE as u64 - 1)
            .min(available) as usize;

        self.reader.seek(SeekFrom::Start(start))?;
        let mut buffer = vec![0u8; read_len];
        self.reader.read_exact(&mut buffer)?;

        for (i, word) in buffer.windows(HEADER_SIZE).enumerate() {
            if i as u64 >= candidates {
                break;
            }
            if !FrameHeader::is_sync_candidate(word[0], word[1]) {
                continue;
            }

            let offset = start + i as u64;
            match FrameHeader::parse(word, offset) {
                Ok(header) => {
                    debug!("First frame header at offset {offset}: {header}");
                    return Ok(Some(header));
                }
                Err(e) => trace!("False sync at offset {offset}: {e}"),
            }
        }

        debug!("No frame header within {candidates} bytes of offset {start}");
        Ok(None)
    }
}
