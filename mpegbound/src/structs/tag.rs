//! Tag kinds, their anchors, and the head/tail tag containers.
//!
//! A raw MPEG stream has no container to index its metadata, so each tag
//! format has a fixed place relative to the audio frames:
//!
//! | Kind    | Anchor | Persisted at            |
//! |---------|--------|-------------------------|
//! | ID3v2   | Head   | very start of the file  |
//! | ID3v1   | Tail   | very end of the file    |
//! | APE     | Tail   | very end of the file    |
//! | Xiph    | -      | not valid in MPEG       |
//! | MP4     | -      | not valid in MPEG       |

use std::fmt::{Display, Formatter};

use log::debug;

/// Metadata format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Id3v1,
    Id3v2,
    Ape,
    Xiph,
    Mp4,
}

/// Where a tag kind lives relative to the audio frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Head,
    Tail,
    Unsupported,
}

impl TagKind {
    pub const ALL: [TagKind; 5] = [
        TagKind::Id3v1,
        TagKind::Id3v2,
        TagKind::Ape,
        TagKind::Xiph,
        TagKind::Mp4,
    ];

    pub fn anchor(self) -> Anchor {
        match self {
            TagKind::Id3v2 => Anchor::Head,
            TagKind::Id3v1 | TagKind::Ape => Anchor::Tail,
            TagKind::Xiph | TagKind::Mp4 => Anchor::Unsupported,
        }
    }
}

impl Display for TagKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagKind::Id3v1 => write!(f, "ID3v1"),
            TagKind::Id3v2 => write!(f, "ID3v2"),
            TagKind::Ape => write!(f, "APE"),
            TagKind::Xiph => write!(f, "Xiph"),
            TagKind::Mp4 => write!(f, "MP4"),
        }
    }
}

/// Byte range occupied by a tag that exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRegion {
    pub offset: u64,
    pub size: u64,
}

impl TagRegion {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// A tag block. Contents are opaque here; only kind and placement are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    region: Option<TagRegion>,
}

impl Tag {
    pub fn on_disk(kind: TagKind, region: TagRegion) -> Self {
        Self {
            kind,
            region: Some(region),
        }
    }

    /// A tag created in memory and not yet persisted.
    pub fn pending(kind: TagKind) -> Self {
        Self { kind, region: None }
    }

    pub fn region(&self) -> Option<TagRegion> {
        self.region
    }

    pub fn is_pending(&self) -> bool {
        self.region.is_none()
    }
}

/// Ordered tags on one side of the audio frames, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagContainer {
    tags: Vec<Tag>,
}

impl TagContainer {
    pub fn find(&self, kind: TagKind) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.kind == kind)
    }

    fn position(&self, kind: TagKind) -> Option<usize> {
        self.tags.iter().position(|tag| tag.kind == kind)
    }

    /// Places a tag first, so it persists at the very start of the file.
    pub fn insert_front(&mut self, tag: Tag) -> &mut Tag {
        self.tags.insert(0, tag);
        &mut self.tags[0]
    }

    /// Places a tag last, so it persists at the very end of the file.
    pub fn push_back(&mut self, tag: Tag) -> &mut Tag {
        let index = self.tags.len();
        self.tags.push(tag);
        &mut self.tags[index]
    }

    pub fn remove(&mut self, kind: TagKind) -> usize {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.kind != kind);
        before - self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The two tag containers bracketing the audio frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub head: TagContainer,
    pub tail: TagContainer,
}

impl TagSet {
    pub fn new(head: TagContainer, tail: TagContainer) -> Self {
        Self { head, tail }
    }

    /// Looks up a tag of `kind` in either container, creating it at its
    /// anchor when missing and `create` is set.
    ///
    /// An existing tag is always returned unchanged. Kinds without an anchor
    /// resolve to `None` and leave both containers untouched.
    pub fn resolve(&mut self, kind: TagKind, create: bool) -> Option<&mut Tag> {
        if let Some(index) = self.head.position(kind) {
            return Some(&mut self.head.tags[index]);
        }
        if let Some(index) = self.tail.position(kind) {
            return Some(&mut self.tail.tags[index]);
        }

        if !create {
            return None;
        }

        match kind.anchor() {
            Anchor::Head => {
                debug!("Creating {kind} tag at head of stream");
                Some(self.head.insert_front(Tag::pending(kind)))
            }
            Anchor::Tail => {
                debug!("Creating {kind} tag at tail of stream");
                Some(self.tail.push_back(Tag::pending(kind)))
            }
            Anchor::Unsupported => {
                debug!("{kind} tags cannot be anchored in an MPEG stream");
                None
            }
        }
    }

    pub fn get(&self, kind: TagKind) -> Option<&Tag> {
        self.head.find(kind).or_else(|| self.tail.find(kind))
    }

    /// Kinds present in either container, head first, in file order.
    pub fn kinds(&self) -> Vec<TagKind> {
        let mut kinds = Vec::new();
        for tag in self.head.iter().chain(self.tail.iter()) {
            if !kinds.contains(&tag.kind) {
                kinds.push(tag.kind);
            }
        }
        kinds
    }

    /// Drops every tag of the given kinds. Returns the number removed.
    pub fn remove(&mut self, kinds: &[TagKind]) -> usize {
        kinds
            .iter()
            .map(|&kind| self.head.remove(kind) + self.tail.remove(kind))
            .sum()
    }
}

/// Lookup-or-create access to tags by kind.
pub trait TagResolver {
    fn resolve(&mut self, kind: TagKind, create: bool) -> Option<&mut Tag>;
}

impl TagResolver for TagSet {
    fn resolve(&mut self, kind: TagKind, create: bool) -> Option<&mut Tag> {
        TagSet::resolve(self, kind, create)
    }
}
