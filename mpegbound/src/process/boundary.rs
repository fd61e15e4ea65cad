use std::time::Duration;

use anyhow::{Result, bail};
use log::debug;

use crate::process::locate::HeaderLocator;
use crate::process::{MediaSpan, ReadStyle, SCAN_WINDOW};
use crate::structs::header::FrameHeader;
use crate::structs::policy::TagCreationPolicy;
use crate::structs::properties::Properties;
use crate::structs::tag::{TagKind, TagResolver};
use crate::utils::errors::BoundaryError;

/// Hooks a file engine calls at fixed points while opening a raw stream.
///
/// Call order is [`establish_start`](Self::establish_start), then
/// [`establish_end`](Self::establish_end), then
/// [`derive_properties`](Self::derive_properties). Every input is passed
/// explicitly; implementations keep only what the previous hook established.
pub trait BoundaryHooks {
    /// Anchors the stream at its first frame header.
    ///
    /// `start` is the offset where the head tag region ends.
    fn establish_start(
        &mut self,
        locator: &mut dyn HeaderLocator,
        start: u64,
        style: ReadStyle,
    ) -> Result<()>;

    /// Materializes the default tags the policy asks for.
    ///
    /// `end` is the offset where the tail tag region begins.
    fn establish_end(&mut self, tags: &mut dyn TagResolver, end: u64, policy: &TagCreationPolicy);

    /// Combines the first header with the media span.
    fn derive_properties(&mut self, span: MediaSpan) -> Result<Properties, BoundaryError>;
}

/// [`BoundaryHooks`] for MPEG audio streams.
#[derive(Debug, Default)]
pub struct MpegBoundary {
    first_header: Option<FrameHeader>,
}

impl MpegBoundary {
    /// The canonical first header of this open session, if established.
    pub fn first_header(&self) -> Option<&FrameHeader> {
        self.first_header.as_ref()
    }
}

impl BoundaryHooks for MpegBoundary {
    fn establish_start(
        &mut self,
        locator: &mut dyn HeaderLocator,
        start: u64,
        style: ReadStyle,
    ) -> Result<()> {
        if !style.inspects_stream() {
            debug!("Read style {style}: skipping frame header search");
            return Ok(());
        }

        let Some(header) = locator.locate(start, SCAN_WINDOW)? else {
            bail!(BoundaryError::CorruptFile {
                start,
                window: SCAN_WINDOW,
            });
        };

        self.first_header = Some(header);
        Ok(())
    }

    fn establish_end(&mut self, tags: &mut dyn TagResolver, end: u64, policy: &TagCreationPolicy) {
        debug!(
            "Applying tag creation policy at end offset {end}: id3v2 = {}, id3v1 = {}",
            policy.create_id3v2(),
            policy.create_id3v1()
        );

        tags.resolve(TagKind::Id3v2, policy.create_id3v2());
        tags.resolve(TagKind::Id3v1, policy.create_id3v1());
    }

    fn derive_properties(&mut self, span: MediaSpan) -> Result<Properties, BoundaryError> {
        let Some(header) = self.first_header.as_mut() else {
            return Err(BoundaryError::PropertiesUnavailable);
        };

        header.bind_stream_length(span.len());

        Ok(Properties::new(Duration::ZERO, header.clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::locate::StreamLocator;
    use crate::structs::tag::{Tag, TagSet};

    /// Locator double that records how often it was asked.
    #[derive(Default)]
    pub(crate) struct CountingLocator {
        pub calls: usize,
        pub header_at: Option<u64>,
    }

    impl HeaderLocator for CountingLocator {
        fn locate(&mut self, start: u64, window: u64) -> Result<Option<FrameHeader>> {
            self.calls += 1;
            assert_eq!(window, SCAN_WINDOW);

            Ok(self
                .header_at
                .filter(|&offset| offset >= start && offset - start < window)
                .map(|offset| FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0x64], offset))
                .transpose()?)
        }
    }

    /// Resolver double that records each lookup in call order.
    #[derive(Default)]
    struct RecordingResolver {
        calls: Vec<(TagKind, bool)>,
        created: Vec<Tag>,
    }

    impl TagResolver for RecordingResolver {
        fn resolve(&mut self, kind: TagKind, create: bool) -> Option<&mut Tag> {
            self.calls.push((kind, create));
            if !create {
                return None;
            }
            self.created.push(Tag::pending(kind));
            self.created.last_mut()
        }
    }

    #[test]
    fn start_found_at_offset_100() -> Result<()> {
        let mut data = vec![0u8; 100];
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        data.resize(1000, 0);
        let mut locator = StreamLocator::new(Cursor::new(data));

        let mut boundary = MpegBoundary::default();
        boundary.establish_start(&mut locator, 0, ReadStyle::Average)?;

        assert_eq!(boundary.first_header().map(|h| h.offset), Some(100));
        Ok(())
    }

    #[test]
    fn start_skipped_without_inspection() -> Result<()> {
        for style in [ReadStyle::None, ReadStyle::Fast] {
            let mut locator = CountingLocator {
                header_at: Some(100),
                ..Default::default()
            };

            let mut boundary = MpegBoundary::default();
            boundary.establish_start(&mut locator, 0, style)?;

            assert_eq!(locator.calls, 0);
            assert!(boundary.first_header().is_none());
        }
        Ok(())
    }

    #[test]
    fn start_fails_past_window() {
        let mut data = vec![0u8; SCAN_WINDOW as usize];
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        let mut locator = StreamLocator::new(Cursor::new(data));

        let mut boundary = MpegBoundary::default();
        let err = boundary
            .establish_start(&mut locator, 0, ReadStyle::Accurate)
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<BoundaryError>(),
            Some(&BoundaryError::CorruptFile {
                start: 0,
                window: SCAN_WINDOW,
            })
        );
        assert!(boundary.first_header().is_none());
    }

    #[test]
    fn end_follows_policy() {
        let mut tags = TagSet::default();
        let mut boundary = MpegBoundary::default();

        boundary.establish_end(&mut tags, 0, &TagCreationPolicy::new(false, true));

        assert_eq!(tags.kinds(), vec![TagKind::Id3v2]);
        assert!(tags.tail.is_empty());

        let mut tags = TagSet::default();
        boundary.establish_end(&mut tags, 0, &TagCreationPolicy::default());
        assert_eq!(tags.kinds(), vec![TagKind::Id3v2, TagKind::Id3v1]);

        let mut tags = TagSet::default();
        boundary.establish_end(&mut tags, 0, &TagCreationPolicy::new(false, false));
        assert_eq!(tags, TagSet::default());
    }

    #[test]
    fn properties_bind_media_span() -> Result<()> {
        let mut locator = CountingLocator {
            header_at: Some(1000),
            ..Default::default()
        };
        let mut boundary = MpegBoundary::default();
        boundary.establish_start(&mut locator, 1000, ReadStyle::Average)?;

        let properties = boundary.derive_properties(MediaSpan::new(1000, 5000))?;

        assert_eq!(properties.header().stream_length(), Some(4000));
        assert_eq!(properties.stream_length(), Some(4000));
        assert_eq!(properties.duration_hint(), Duration::ZERO);
        assert_eq!(properties.header().offset, 1000);
        assert_eq!(
            boundary.first_header().and_then(|h| h.stream_length()),
            Some(4000)
        );
        Ok(())
    }

    #[test]
    fn end_resolves_head_before_tail() {
        let mut boundary = MpegBoundary::default();

        let mut resolver = RecordingResolver::default();
        boundary.establish_end(&mut resolver, 0, &TagCreationPolicy::default());
        assert_eq!(
            resolver.calls,
            vec![(TagKind::Id3v2, true), (TagKind::Id3v1, true)]
        );

        let mut resolver = RecordingResolver::default();
        boundary.establish_end(&mut resolver, 0, &TagCreationPolicy::new(true, false));
        assert_eq!(
            resolver.calls,
            vec![(TagKind::Id3v2, false), (TagKind::Id3v1, true)]
        );
        assert_eq!(resolver.created, vec![Tag::pending(TagKind::Id3v1)]);
    }

    #[test]
    fn inverted_span_binds_empty_stream() -> Result<()> {
        let mut locator = CountingLocator {
            header_at: Some(0),
            ..Default::default()
        };
        let mut boundary = MpegBoundary::default();
        boundary.establish_start(&mut locator, 0, ReadStyle::Average)?;

        let properties = boundary.derive_properties(MediaSpan::new(5000, 1000))?;

        assert_eq!(properties.stream_length(), Some(0));
        Ok(())
    }

    #[test]
    fn properties_unavailable_without_header() {
        let mut boundary = MpegBoundary::default();
        assert_eq!(
            boundary.derive_properties(MediaSpan::new(0, 100)),
            Err(BoundaryError::PropertiesUnavailable)
        );
    }
}
