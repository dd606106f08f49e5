//! # Domain Models
//!
//! These structs represent the core entities of the stories domain.
//! Ids are plain integers assigned by the repository, monotonically increasing.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a story stays visible after it is posted.
pub const STORY_TTL_HOURS: i64 = 24;

/// The active window as a chrono duration.
pub fn story_ttl() -> Duration {
    Duration::hours(STORY_TTL_HOURS)
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(StoryId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Maps a parsed MIME type onto a media kind. Anything that is not
    /// `image/*` or `video/*` is rejected.
    pub fn from_mime(mime: &mime::Mime) -> Option<Self> {
        match mime.type_() {
            mime::IMAGE => Some(Self::Image),
            mime::VIDEO => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_content_type(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<mime::Mime>()
            .ok()
            .and_then(|m| Self::from_mime(&m))
    }

    /// Guesses the kind from the extension of a media URL, ignoring any
    /// query string or fragment.
    pub fn guess_from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        mime_guess::from_path(path)
            .iter()
            .find_map(|m| Self::from_mime(&m))
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// A member of the network. Only the fields the story viewer shows are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// An ephemeral media post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub owner_id: UserId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Advisory only. Activity is always recomputed from `created_at`.
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub viewer_ids: BTreeSet<UserId>,
}

impl Story {
    /// A story is active while it is younger than the TTL.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < story_ttl()
    }

    pub fn view_count(&self) -> usize {
        self.viewer_ids.len()
    }

    pub fn viewed_by(&self, viewer: UserId) -> bool {
        self.viewer_ids.contains(&viewer)
    }

    /// Adds a viewer. Returns `false` when the viewer was already recorded.
    pub fn add_viewer(&mut self, viewer: UserId) -> bool {
        self.viewer_ids.insert(viewer)
    }
}

/// Creation input. Id, timestamps and viewers are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    pub owner_id: UserId,
    pub media_url: String,
    /// When absent the kind is guessed from `media_url`.
    #[serde(default)]
    pub media_kind: Option<MediaKind>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Partial update. `None` leaves the field as it is; the id and owner never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPatch {
    pub media_url: Option<String>,
    pub caption: Option<String>,
}
