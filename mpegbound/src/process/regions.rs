//! Tag region detection.
//!
//! ## Head Region
//!
//! Starting at offset 0, consecutive blocks are measured while one of these
//! is found at the current offset:
//!
//! - **ID3v2 header**: `"ID3"`, version, flags, 28-bit syncsafe size. The
//!   footer flag (0x10) adds a 10 byte footer.
//! - **APE header**: `"APETAGEX"` with the is-header flag (bit 29) set. The
//!   size field excludes the 32 byte header.
//!
//! ## Tail Region
//!
//! Starting at end of stream and walking backwards, never below the end of
//! the head region:
//!
//! - **APE footer**: `"APETAGEX"` in the last 32 bytes, is-header flag clear.
//!   The has-header flag (bit 31) adds a leading 32 byte header.
//! - **ID3v1**: `"TAG"` at 128 bytes before the end.
//! - **ID3v2 footer**: `"3DI"` in the last 10 bytes.
//!
//! Only sizes and positions are read; tag bodies are never parsed.

use std::io::{self, Read, Seek, SeekFrom};

use anyhow::Result;
use log::Level::Warn;
use log::{debug, trace};

use crate::log_or_err;
use crate::process::MediaSpan;
use crate::structs::tag::{Tag, TagContainer, TagKind, TagRegion, TagSet};
use crate::utils::errors::RegionError;

const ID3V2_HEADER_SIZE: u64 = 10;
const ID3V2_FOOTER_FLAG: u8 = 0x10;
const ID3V1_SIZE: u64 = 128;
const APE_HEADER_SIZE: u64 = 32;
const APE_PREAMBLE: &[u8; 8] = b"APETAGEX";
const APE_FLAG_HAS_HEADER: u32 = 1 << 31;
const APE_FLAG_IS_HEADER: u32 = 1 << 29;

/// Tags found around the audio and the span they leave for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    pub tags: TagSet,
    pub span: MediaSpan,
}

/// Measures head and tail tag regions of a raw MPEG stream.
#[derive(Debug, Clone, Copy)]
pub struct RegionReader {
    pub fail_level: log::Level,
}

impl Default for RegionReader {
    fn default() -> Self {
        Self::new(log::Level::Error)
    }
}

impl RegionReader {
    pub fn new(fail_level: log::Level) -> Self {
        Self { fail_level }
    }

    pub fn read<R: Read + Seek>(&self, reader: &mut R) -> Result<Regions> {
        let length = reader.seek(SeekFrom::End(0))?;

        let (head, start) = self.read_head(reader, length)?;
        let (tail, end) = self.read_tail(reader, start, length)?;

        debug!(
            "Tag regions: head {} tag(s) ending at {start}, tail {} tag(s) starting at {end}",
            head.len(),
            tail.len()
        );

        Ok(Regions {
            tags: TagSet::new(head, tail),
            span: MediaSpan::new(start, end),
        })
    }

    fn read_head<R: Read + Seek>(
        &self,
        reader: &mut R,
        length: u64,
    ) -> Result<(TagContainer, u64)> {
        let mut container = TagContainer::default();
        let mut offset = 0;

        loop {
            let found = match self.id3v2_at(reader, offset, length)? {
                Some(size) => Some((TagKind::Id3v2, size)),
                None => self
                    .ape_header_at(reader, offset, length)?
                    .map(|size| (TagKind::Ape, size)),
            };

            let Some((kind, size)) = found else {
                break;
            };

            let region = TagRegion { offset, size };
            trace!("{kind} tag at head: {region:?}");
            container.push_back(Tag::on_disk(kind, region));
            offset = region.end();
        }

        Ok((container, offset))
    }

    fn read_tail<R: Read + Seek>(
        &self,
        reader: &mut R,
        lower: u64,
        length: u64,
    ) -> Result<(TagContainer, u64)> {
        let mut container = TagContainer::default();
        let mut end = length;

        loop {
            let found = if let Some(size) = self.ape_footer_before(reader, lower, end)? {
                Some((TagKind::Ape, size))
            } else if Self::id3v1_before(reader, lower, end)? {
                Some((TagKind::Id3v1, ID3V1_SIZE))
            } else {
                self.id3v2_footer_before(reader, lower, end)?
                    .map(|size| (TagKind::Id3v2, size))
            };

            let Some((kind, size)) = found else {
                break;
            };

            let region = TagRegion {
                offset: end - size,
                size,
            };
            trace!("{kind} tag at tail: {region:?}");
            container.insert_front(Tag::on_disk(kind, region));
            end = region.offset;
        }

        Ok((container, end))
    }

    fn id3v2_at<R: Read + Seek>(
        &self,
        reader: &mut R,
        offset: u64,
        length: u64,
    ) -> Result<Option<u64>> {
        let mut header = [0u8; ID3V2_HEADER_SIZE as usize];
        if !read_at(reader, offset, length, &mut header)? || &header[..3] != b"ID3" {
            return Ok(None);
        }
        if header[3] == 0xFF || header[4] == 0xFF {
            return Ok(None);
        }

        let Some(body) = syncsafe(&header[6..10]) else {
            return Ok(self.malformed(TagKind::Id3v2, offset)?);
        };

        let footer = if header[5] & ID3V2_FOOTER_FLAG != 0 {
            ID3V2_HEADER_SIZE
        } else {
            0
        };
        let size = ID3V2_HEADER_SIZE + body as u64 + footer;

        Ok(self.check_bounds(TagKind::Id3v2, offset, size, length - offset)?)
    }

    fn ape_header_at<R: Read + Seek>(
        &self,
        reader: &mut R,
        offset: u64,
        length: u64,
    ) -> Result<Option<u64>> {
        let mut header = [0u8; APE_HEADER_SIZE as usize];
        if !read_at(reader, offset, length, &mut header)? || &header[..8] != APE_PREAMBLE {
            return Ok(None);
        }

        let flags = le_u32(&header[20..24]);
        if flags & APE_FLAG_IS_HEADER == 0 {
            return Ok(None);
        }

        let size = APE_HEADER_SIZE + le_u32(&header[12..16]) as u64;
        Ok(self.check_bounds(TagKind::Ape, offset, size, length - offset)?)
    }

    fn ape_footer_before<R: Read + Seek>(
        &self,
        reader: &mut R,
        lower: u64,
        end: u64,
    ) -> Result<Option<u64>> {
        let Some(offset) = end.checked_sub(APE_HEADER_SIZE).filter(|&o| o >= lower) else {
            return Ok(None);
        };

        let mut footer = [0u8; APE_HEADER_SIZE as usize];
        if !read_at(reader, offset, end, &mut footer)? || &footer[..8] != APE_PREAMBLE {
            return Ok(None);
        }

        let flags = le_u32(&footer[20..24]);
        if flags & APE_FLAG_IS_HEADER != 0 {
            return Ok(None);
        }

        let mut size = le_u32(&footer[12..16]) as u64;
        if size < APE_HEADER_SIZE {
            return Ok(self.malformed(TagKind::Ape, offset)?);
        }
        if flags & APE_FLAG_HAS_HEADER != 0 {
            size += APE_HEADER_SIZE;
        }

        Ok(self.check_bounds(TagKind::Ape, offset, size, end - lower)?)
    }

    fn id3v1_before<R: Read + Seek>(reader: &mut R, lower: u64, end: u64) -> Result<bool> {
        let Some(offset) = end.checked_sub(ID3V1_SIZE).filter(|&o| o >= lower) else {
            return Ok(false);
        };

        let mut marker = [0u8; 3];
        Ok(read_at(reader, offset, end, &mut marker)? && &marker == b"TAG")
    }

    fn id3v2_footer_before<R: Read + Seek>(
        &self,
        reader: &mut R,
        lower: u64,
        end: u64,
    ) -> Result<Option<u64>> {
        let Some(offset) = end.checked_sub(ID3V2_HEADER_SIZE).filter(|&o| o >= lower) else {
            return Ok(None);
        };

        let mut footer = [0u8; ID3V2_HEADER_SIZE as usize];
        if !read_at(reader, offset, end, &mut footer)? || &footer[..3] != b"3DI" {
            return Ok(None);
        }

        let Some(body) = syncsafe(&footer[6..10]) else {
            return Ok(self.malformed(TagKind::Id3v2, offset)?);
        };

        let size = 2 * ID3V2_HEADER_SIZE + body as u64;
        Ok(self.check_bounds(TagKind::Id3v2, offset, size, end - lower)?)
    }

    fn malformed(&self, kind: TagKind, offset: u64) -> Result<Option<u64>, RegionError> {
        log_or_err!(self, Warn, RegionError::MalformedSize { kind, offset });
        Ok(None)
    }

    fn check_bounds(
        &self,
        kind: TagKind,
        offset: u64,
        size: u64,
        available: u64,
    ) -> Result<Option<u64>, RegionError> {
        if size > available {
            log_or_err!(
                self,
                Warn,
                RegionError::Overflow {
                    kind,
                    offset,
                    size,
                    available,
                }
            );
            return Ok(None);
        }

        Ok(Some(size))
    }
}

/// Fills `buf` from `offset`, returning `false` when it would cross `limit`.
fn read_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    limit: u64,
    buf: &mut [u8],
) -> io::Result<bool> {
    if offset + buf.len() as u64 > limit {
        return Ok(false);
    }

    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(buf)?;
    Ok(true)
}

fn syncsafe(bytes: &[u8]) -> Option<u32> {
    if bytes.iter().any(|b| b & 0x80 != 0) {
        return None;
    }
    Some(bytes.iter().fold(0, |acc, &b| (acc << 7) | b as u32))
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::fixtures::*;
    use super::*;

    fn read(data: Vec<u8>) -> Result<Regions> {
        RegionReader::default().read(&mut Cursor::new(data))
    }

    fn layout(container: &TagContainer) -> Vec<(TagKind, u64, u64)> {
        container
            .iter()
            .map(|tag| {
                let region = tag.region().unwrap();
                (tag.kind, region.offset, region.size)
            })
            .collect()
    }

    #[test]
    fn bare_stream_has_full_span() -> Result<()> {
        let regions = read(frames(2000))?;
        assert_eq!(regions.span, MediaSpan::new(0, 2000));
        assert!(regions.tags.head.is_empty());
        assert!(regions.tags.tail.is_empty());
        Ok(())
    }

    #[test]
    fn id3v2_and_ape_at_head() -> Result<()> {
        let mut data = id3v2(1000, false);
        data.extend(ape(64));
        data.extend(frames(3000));

        let regions = read(data)?;
        assert_eq!(
            layout(&regions.tags.head),
            vec![(TagKind::Id3v2, 0, 1010), (TagKind::Ape, 1010, 128)]
        );
        assert_eq!(regions.span, MediaSpan::new(1138, 4138));
        Ok(())
    }

    #[test]
    fn id3v2_footer_flag_extends_head() -> Result<()> {
        let mut data = id3v2(100, true);
        data.extend(frames(500));

        let regions = read(data)?;
        assert_eq!(regions.span.start(), 120);
        Ok(())
    }

    #[test]
    fn tail_tags_in_file_order() -> Result<()> {
        let mut data = frames(3000);
        data.extend(id3v2(50, true));
        data.extend(ape(40));
        data.extend(id3v1());

        let regions = read(data)?;
        assert_eq!(
            layout(&regions.tags.tail),
            vec![
                (TagKind::Id3v2, 3000, 70),
                (TagKind::Ape, 3070, 104),
                (TagKind::Id3v1, 3174, 128),
            ]
        );
        assert_eq!(regions.span, MediaSpan::new(0, 3000));
        Ok(())
    }

    #[test]
    fn tail_never_crosses_head() -> Result<()> {
        // A stream that is nothing but an ID3v1 block is a head-less, audio-less tail.
        let regions = read(id3v1())?;
        assert_eq!(regions.span, MediaSpan::new(0, 0));
        assert_eq!(regions.tags.tail.len(), 1);

        // An oversized ID3v2 footer that would reach into the head region is ignored.
        let mut data = id3v2(10, false);
        data.extend(frames(100));
        data.extend_from_slice(&[b'3', b'D', b'I', 4, 0, 0x10, 0, 0, 0x7F, 0x7F]);
        let regions = read(data)?;
        assert!(regions.tags.tail.is_empty());
        assert_eq!(regions.span, MediaSpan::new(20, 130));
        Ok(())
    }

    #[test]
    fn oversized_id3v2_is_logged_or_fatal() -> Result<()> {
        let mut data = id3v2(10, false);
        data[9] = 0x7F;
        data.extend(frames(40));

        let regions = read(data.clone())?;
        assert!(regions.tags.head.is_empty());
        assert_eq!(regions.span.start(), 0);

        let strict = RegionReader::new(Warn).read(&mut Cursor::new(data));
        let err = strict.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegionError>(),
            Some(&RegionError::Overflow {
                kind: TagKind::Id3v2,
                offset: 0,
                size: 137,
                available: 60,
            })
        );
        Ok(())
    }

    #[test]
    fn malformed_syncsafe_size() -> Result<()> {
        let mut data = id3v2(10, false);
        data[8] = 0x80;
        data.extend(frames(40));

        assert!(read(data.clone())?.tags.head.is_empty());

        let err = RegionReader::new(Warn)
            .read(&mut Cursor::new(data))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegionError>(),
            Some(&RegionError::MalformedSize {
                kind: TagKind::Id3v2,
                offset: 0,
            })
        );
        Ok(())
    }

    #[test]
    fn syncsafe_decoding() {
        assert_eq!(syncsafe(&[0x00, 0x00, 0x07, 0x68]), Some(1000));
        assert_eq!(syncsafe(&[0x7F, 0x7F, 0x7F, 0x7F]), Some(0x0FFF_FFFF));
        assert_eq!(syncsafe(&[0x00, 0x80, 0x00, 0x00]), None);
    }
}
