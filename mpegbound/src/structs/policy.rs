//! Tag creation policy applied when a file is opened.

use crate::utils::errors::PolicyError;

/// Whether missing ID3 tags are materialized when a file is opened.
///
/// The ID3v2 switch governs the head-anchored tag, the ID3v1 switch the
/// tail-anchored one. They are independent; [`create_tags`](Self::create_tags)
/// only answers when both agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagCreationPolicy {
    create_id3v1: bool,
    create_id3v2: bool,
}

impl Default for TagCreationPolicy {
    fn default() -> Self {
        Self {
            create_id3v1: true,
            create_id3v2: true,
        }
    }
}

impl TagCreationPolicy {
    pub fn new(create_id3v1: bool, create_id3v2: bool) -> Self {
        Self {
            create_id3v1,
            create_id3v2,
        }
    }

    pub fn create_id3v1(&self) -> bool {
        self.create_id3v1
    }

    pub fn set_create_id3v1(&mut self, create: bool) {
        self.create_id3v1 = create;
    }

    pub fn create_id3v2(&self) -> bool {
        self.create_id3v2
    }

    pub fn set_create_id3v2(&mut self, create: bool) {
        self.create_id3v2 = create;
    }

    /// Combined switch. Fails when the two switches disagree.
    pub fn create_tags(&self) -> Result<bool, PolicyError> {
        if self.create_id3v1 != self.create_id3v2 {
            return Err(PolicyError::Inconsistent {
                id3v1: self.create_id3v1,
                id3v2: self.create_id3v2,
            });
        }
        Ok(self.create_id3v1)
    }

    pub fn set_create_tags(&mut self, create: bool) {
        self.create_id3v1 = create;
        self.create_id3v2 = create;
    }
}

#[test]
fn combined_accessor() {
    let mut policy = TagCreationPolicy::default();
    assert_eq!(policy.create_tags(), Ok(true));

    policy.set_create_tags(false);
    assert_eq!(policy.create_tags(), Ok(false));

    policy.set_create_id3v2(true);
    assert_eq!(
        policy.create_tags(),
        Err(PolicyError::Inconsistent {
            id3v1: false,
            id3v2: true
        })
    );
    // Per-switch access is unaffected by the disagreement.
    assert!(!policy.create_id3v1());
    assert!(policy.create_id3v2());

    for create in [true, false] {
        policy.set_create_tags(create);
        assert_eq!(policy.create_id3v1(), create);
        assert_eq!(policy.create_id3v2(), create);
    }
}
