use std::path::Path;

use serde::Serialize;

use mpegbound::process::file::MpegFile;
use mpegbound::structs::properties::Properties;
use mpegbound::structs::tag::{Anchor, Tag};

/// Serializable summary of an opened file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub read_style: String,
    pub media_span: SpanReport,
    pub tags_on_disk: Vec<String>,
    pub tags: Vec<TagReport>,
    pub properties: Option<PropertiesReport>,
}

#[derive(Debug, Serialize)]
pub struct SpanReport {
    pub start: u64,
    pub end: u64,
    pub length: u64,
}

#[derive(Debug, Serialize)]
pub struct TagReport {
    pub kind: String,
    pub side: &'static str,
    pub offset: Option<u64>,
    pub size: Option<u64>,
    pub pending: bool,
}

#[derive(Debug, Serialize)]
pub struct PropertiesReport {
    pub version: String,
    pub layer: String,
    pub sample_rate: u32,
    pub bitrate_kbps: Option<u16>,
    pub channels: u8,
    pub channel_mode: String,
    pub first_frame_offset: u64,
    pub stream_length: Option<u64>,
}

impl FileReport {
    pub fn new(path: &Path, file: &MpegFile) -> Self {
        let span = file.media_span();

        let head = file.head_tags().iter().map(|tag| TagReport::new(tag, "head"));
        let tail = file.tail_tags().iter().map(|tag| TagReport::new(tag, "tail"));

        Self {
            path: path.display().to_string(),
            read_style: file.read_style().to_string(),
            media_span: SpanReport {
                start: span.start(),
                end: span.end(),
                length: span.len(),
            },
            tags_on_disk: file
                .tag_kinds_on_disk()
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
            tags: head.chain(tail).collect(),
            properties: file.properties().ok().map(PropertiesReport::new),
        }
    }

    pub fn print_text(&self) {
        println!();
        println!("MPEG Stream Boundaries");
        println!("======================");
        println!();
        println!("File                        {}", self.path);
        println!("Read style                  {}", self.read_style);
        println!();

        println!("Media Span");
        println!("  Start                     {}", self.media_span.start);
        println!("  End                       {}", self.media_span.end);
        println!("  Length                    {} bytes", self.media_span.length);
        println!();

        println!("Tags");
        if self.tags.is_empty() {
            println!("  (none)");
        }
        for tag in &self.tags {
            match (tag.offset, tag.size) {
                (Some(offset), Some(size)) => println!(
                    "  {:6} {:4}               {size} bytes at {offset}",
                    tag.kind, tag.side
                ),
                _ => println!("  {:6} {:4}               new, not yet written", tag.kind, tag.side),
            }
        }
        println!();

        match &self.properties {
            Some(props) => {
                println!("Stream Properties");
                println!("  Format                    {} {}", props.version, props.layer);
                println!("  Sampling rate             {} Hz", props.sample_rate);
                match props.bitrate_kbps {
                    Some(kbps) => println!("  Bitrate                   {kbps} kbps"),
                    None => println!("  Bitrate                   free format"),
                }
                println!("  Channels                  {} ({})", props.channels, props.channel_mode);
                println!("  First frame offset        {}", props.first_frame_offset);
                if let Some(length) = props.stream_length {
                    println!("  Stream length             {length} bytes");
                }
            }
            None => println!("Stream properties unavailable at read style {}", self.read_style),
        }
        println!();
    }
}

impl TagReport {
    fn new(tag: &Tag, side: &'static str) -> Self {
        let region = tag.region();
        debug_assert!(tag.kind.anchor() != Anchor::Unsupported);

        Self {
            kind: tag.kind.to_string(),
            side,
            offset: region.map(|r| r.offset),
            size: region.map(|r| r.size),
            pending: tag.is_pending(),
        }
    }
}

impl PropertiesReport {
    fn new(props: &Properties) -> Self {
        Self {
            version: props.version().to_string(),
            layer: props.layer().to_string(),
            sample_rate: props.sample_rate(),
            bitrate_kbps: props.bitrate(),
            channels: props.channels(),
            channel_mode: props.channel_mode().to_string(),
            first_frame_offset: props.header().offset,
            stream_length: props.stream_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use mpegbound::process::OpenOptions;

    fn stream() -> Vec<u8> {
        let mut data = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 22];
        data.resize(32, 0);
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        data.resize(2048, 0);
        data
    }

    #[test]
    fn report_lists_tags_and_properties() -> anyhow::Result<()> {
        let file = MpegFile::open(&mut Cursor::new(stream()), &OpenOptions::default())?;
        let report = FileReport::new(Path::new("track.mp3"), &file);

        assert_eq!(report.media_span.start, 32);
        assert_eq!(report.media_span.length, 2016);
        assert_eq!(report.tags_on_disk, vec!["ID3v2"]);
        assert_eq!(report.tags.len(), 2);
        assert_eq!(report.tags[0].offset, Some(0));
        assert!(report.tags[1].pending);
        assert_eq!(report.tags[1].side, "tail");

        let props = report.properties.as_ref().unwrap();
        assert_eq!(props.first_frame_offset, 32);
        assert_eq!(props.stream_length, Some(2016));

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("sample_rate: 44100"));
        Ok(())
    }
}
