use std::io::{Read, Seek};

use anyhow::Result;
use log::{debug, info};

use crate::process::boundary::{BoundaryHooks, MpegBoundary};
use crate::process::locate::{HeaderLocator, StreamLocator};
use crate::process::regions::{RegionReader, Regions};
use crate::process::{MediaSpan, OpenOptions, ReadStyle};
use crate::structs::header::FrameHeader;
use crate::structs::properties::Properties;
use crate::structs::tag::{Tag, TagContainer, TagKind, TagSet};
use crate::utils::errors::BoundaryError;

/// An opened raw MPEG audio file.
///
/// Opening measures the tag regions at both ends of the stream, anchors the
/// stream at its first frame header, materializes the tags the creation
/// policy asks for and derives the audio properties.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mpegbound::process::OpenOptions;
/// use mpegbound::process::file::MpegFile;
/// use mpegbound::structs::tag::TagKind;
///
/// let mut data = vec![0u8; 64];
/// data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
/// data.resize(4096, 0);
///
/// let mut file = MpegFile::open(&mut Cursor::new(data), &OpenOptions::default())?;
///
/// assert_eq!(file.properties()?.sample_rate(), 44100);
/// assert!(file.tag(TagKind::Id3v2, false).is_some());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct MpegFile {
    tags: TagSet,
    tags_on_disk: Vec<TagKind>,
    span: MediaSpan,
    boundary: MpegBoundary,
    properties: Option<Properties>,
    read_style: ReadStyle,
}

impl MpegFile {
    /// Opens a stream, searching for the first frame header in `reader`.
    ///
    /// Fails with [`BoundaryError::CorruptFile`] when the read style asks for
    /// stream inspection and no frame header is found.
    pub fn open<R: Read + Seek>(reader: &mut R, options: &OpenOptions) -> Result<Self> {
        let regions = RegionReader::new(options.fail_level).read(reader)?;
        let mut locator = StreamLocator::new(reader);

        Self::assemble(regions, &mut locator, options)
    }

    /// Opens a stream, delegating the frame header search to `locator`.
    pub fn open_with_locator<R, L>(
        reader: &mut R,
        locator: &mut L,
        options: &OpenOptions,
    ) -> Result<Self>
    where
        R: Read + Seek,
        L: HeaderLocator,
    {
        let regions = RegionReader::new(options.fail_level).read(reader)?;

        Self::assemble(regions, locator, options)
    }

    fn assemble(
        regions: Regions,
        locator: &mut dyn HeaderLocator,
        options: &OpenOptions,
    ) -> Result<Self> {
        let Regions { mut tags, span } = regions;
        let tags_on_disk = tags.kinds();
        let mut boundary = MpegBoundary::default();

        boundary.establish_start(locator, span.start(), options.read_style)?;
        boundary.establish_end(&mut tags, span.end(), &options.policy);

        let properties = if options.read_style == ReadStyle::None {
            None
        } else {
            match boundary.derive_properties(span) {
                Ok(properties) => Some(properties),
                Err(BoundaryError::PropertiesUnavailable) => {
                    debug!("No frame header established, properties unavailable");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(
            "Opened MPEG stream: media {}..{} ({} bytes), tags on disk [{}]",
            span.start(),
            span.end(),
            span.len(),
            tags_on_disk
                .iter()
                .map(|kind| kind.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            tags,
            tags_on_disk,
            span,
            boundary,
            properties,
            read_style: options.read_style,
        })
    }

    /// Fetches the tag of `kind`, creating it at its anchor when missing and
    /// `create` is set.
    ///
    /// Kinds that cannot live in an MPEG stream yield `None`.
    pub fn tag(&mut self, kind: TagKind, create: bool) -> Option<&mut Tag> {
        self.tags.resolve(kind, create)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn head_tags(&self) -> &TagContainer {
        &self.tags.head
    }

    pub fn tail_tags(&self) -> &TagContainer {
        &self.tags.tail
    }

    /// Kinds currently held, including ones created since opening.
    pub fn tag_kinds(&self) -> Vec<TagKind> {
        self.tags.kinds()
    }

    /// Kinds found in the stream when it was opened.
    pub fn tag_kinds_on_disk(&self) -> &[TagKind] {
        &self.tags_on_disk
    }

    /// Drops every in-memory tag of the given kinds. Nothing is written.
    pub fn remove_tags(&mut self, kinds: &[TagKind]) -> usize {
        let removed = self.tags.remove(kinds);
        debug!("Removed {removed} tag(s)");
        removed
    }

    pub fn media_span(&self) -> MediaSpan {
        self.span
    }

    /// Offset where the audio starts; unaffected by tag edits.
    pub fn invariant_start(&self) -> u64 {
        self.span.start()
    }

    /// Offset where the audio ends; unaffected by tag edits.
    pub fn invariant_end(&self) -> u64 {
        self.span.end()
    }

    pub fn first_header(&self) -> Option<&FrameHeader> {
        self.boundary.first_header()
    }

    pub fn read_style(&self) -> ReadStyle {
        self.read_style
    }

    pub fn properties(&self) -> Result<&Properties, BoundaryError> {
        self.properties
            .as_ref()
            .ok_or(BoundaryError::PropertiesUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::SCAN_WINDOW;
    use crate::process::boundary::tests::CountingLocator;
    use crate::process::regions::fixtures::{ape, frames, id3v1, id3v2};
    use crate::structs::policy::TagCreationPolicy;

    fn options(read_style: ReadStyle, policy: TagCreationPolicy) -> OpenOptions {
        OpenOptions {
            read_style,
            policy,
            ..Default::default()
        }
    }

    fn open(data: Vec<u8>, options: &OpenOptions) -> Result<MpegFile> {
        MpegFile::open(&mut Cursor::new(data), options)
    }

    #[test]
    fn policy_creates_head_only() -> Result<()> {
        let policy = TagCreationPolicy::new(false, true);
        let mut file = open(frames(5000), &options(ReadStyle::Average, policy))?;

        assert!(file.tag_kinds_on_disk().is_empty());
        assert!(file.tag(TagKind::Id3v2, false).is_some());
        assert!(file.tag(TagKind::Id3v1, false).is_none());
        assert!(file.tail_tags().is_empty());
        Ok(())
    }

    #[test]
    fn default_policy_creates_both() -> Result<()> {
        let mut file = open(frames(5000), &OpenOptions::default())?;

        assert_eq!(file.tag_kinds(), vec![TagKind::Id3v2, TagKind::Id3v1]);
        assert!(file.tag(TagKind::Id3v2, false).unwrap().is_pending());
        assert!(file.tag(TagKind::Ape, false).is_none());
        Ok(())
    }

    #[test]
    fn existing_tags_are_kept() -> Result<()> {
        let mut data = id3v2(200, false);
        data.extend(frames(4000));
        data.extend(ape(32));
        data.extend(id3v1());

        let mut file = open(data, &OpenOptions::default())?;

        assert_eq!(
            file.tag_kinds_on_disk(),
            &[TagKind::Id3v2, TagKind::Ape, TagKind::Id3v1]
        );
        assert_eq!(file.head_tags().len(), 1);
        assert_eq!(file.tail_tags().len(), 2);
        assert!(!file.tag(TagKind::Id3v1, false).unwrap().is_pending());
        assert_eq!(file.media_span(), MediaSpan::new(210, 4210));
        assert_eq!(file.first_header().map(|h| h.offset), Some(210));
        assert_eq!(file.properties()?.stream_length(), Some(4000));
        Ok(())
    }

    #[test]
    fn corrupt_stream_fails_open() {
        let mut data = id3v2(100, false);
        data.extend(vec![0u8; SCAN_WINDOW as usize]);
        data.extend(frames(1000));

        let err = open(data, &OpenOptions::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BoundaryError>(),
            Some(&BoundaryError::CorruptFile {
                start: 110,
                window: SCAN_WINDOW,
            })
        );
    }

    #[test]
    fn corrupt_stream_opens_without_inspection() -> Result<()> {
        let data = vec![0u8; 3 * SCAN_WINDOW as usize];

        for style in [ReadStyle::None, ReadStyle::Fast] {
            let file = open(data.clone(), &options(style, TagCreationPolicy::default()))?;
            assert!(file.first_header().is_none());
            assert_eq!(
                file.properties().unwrap_err(),
                BoundaryError::PropertiesUnavailable
            );
        }
        Ok(())
    }

    #[test]
    fn locator_not_invoked_for_read_style_none() -> Result<()> {
        let mut locator = CountingLocator::default();
        let options = options(ReadStyle::None, TagCreationPolicy::default());

        let file = MpegFile::open_with_locator(
            &mut Cursor::new(frames(1000)),
            &mut locator,
            &options,
        )?;

        assert_eq!(locator.calls, 0);
        assert!(file.properties().is_err());
        Ok(())
    }

    #[test]
    fn locator_starts_after_head_region() -> Result<()> {
        let mut data = id3v2(90, false);
        data.extend(frames(1000));
        let mut locator = CountingLocator {
            header_at: Some(100),
            ..Default::default()
        };

        let file = MpegFile::open_with_locator(
            &mut Cursor::new(data),
            &mut locator,
            &OpenOptions::default(),
        )?;

        assert_eq!(locator.calls, 1);
        assert_eq!(file.invariant_start(), 100);
        assert_eq!(file.invariant_end(), 1100);
        assert_eq!(file.properties()?.header().offset, 100);
        Ok(())
    }

    #[test]
    fn remove_and_recreate() -> Result<()> {
        let mut data = frames(2000);
        data.extend(id3v1());
        let mut file = open(data, &OpenOptions::default())?;

        assert_eq!(file.remove_tags(&[TagKind::Id3v1, TagKind::Id3v2]), 2);
        assert!(file.tag_kinds().is_empty());
        assert_eq!(file.tag_kinds_on_disk(), &[TagKind::Id3v1]);

        let tag = file.tag(TagKind::Id3v1, true).unwrap();
        assert!(tag.is_pending());
        assert!(file.tag(TagKind::Xiph, true).is_none());
        assert_eq!(file.tag_kinds(), vec![TagKind::Id3v1]);
        Ok(())
    }
}
