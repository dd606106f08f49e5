//! stories/crates/services/src/lib.rs
//!
//! Application logic for the story viewer: the session controller, active
//! story filtering, input mapping, and the service facade over the ports.

pub mod active_stories;
pub mod navigation;
pub mod story_service;
pub mod story_session;

pub use active_stories::{filter_active, group_active_by_owner, has_unseen, OwnerStories};
pub use navigation::{Key, NavAction, NavInput, TapZone, DEFAULT_SWIPE_THRESHOLD};
pub use story_service::{SessionRequest, StoryRing, StoryService, ViewerSession, MAX_UPLOAD_BYTES};
pub use story_session::{
    CloseReason, MediaState, SessionContext, SessionSettings, SessionSignal, SessionSnapshot, StorySession,
    DEFAULT_STORY_DURATION,
};
