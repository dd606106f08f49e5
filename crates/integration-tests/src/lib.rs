//! Shared fixtures for the cross-crate tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domains::models::{story_ttl, MediaKind, Story, StoryId, User, UserId};
use services::{SessionContext, SessionSettings};
use storage_adapters::{InMemoryStoryRepo, SimulatedLatency};
use timing_adapters::ManualTickScheduler;

pub const VIEWER: UserId = UserId(1);
pub const OWNER: UserId = UserId(2);

pub fn user(id: i64, username: &str) -> User {
    User {
        id: UserId(id),
        username: username.to_string(),
        display_name: username.to_string(),
        avatar_url: None,
        bio: None,
    }
}

/// An image story owned by `owner`, created `minutes_ago` before `now`.
pub fn story_at(id: i64, owner: UserId, now: DateTime<Utc>, minutes_ago: i64) -> Story {
    let created_at = now - Duration::minutes(minutes_ago);
    Story {
        id: StoryId(id),
        owner_id: owner,
        media_url: format!("https://cdn.example.com/stories/{id}.jpg"),
        media_kind: MediaKind::Image,
        caption: None,
        created_at,
        expires_at: created_at + story_ttl(),
        viewer_ids: BTreeSet::new(),
    }
}

/// `count` active stories for [`OWNER`], a minute apart, oldest first.
pub fn active_stories(count: i64) -> Vec<Story> {
    let now = Utc::now();
    (1..=count).map(|id| story_at(id, OWNER, now, 60 - id)).collect()
}

/// A session context over an in-memory repo seeded with `stories`.
pub fn harness(stories: &[Story]) -> (SessionContext, Arc<InMemoryStoryRepo>, ManualTickScheduler) {
    let repo = Arc::new(InMemoryStoryRepo::with_stories(stories.to_vec(), SimulatedLatency::NONE));
    let scheduler = ManualTickScheduler::new();
    let ctx = SessionContext {
        repo: repo.clone(),
        scheduler: Arc::new(scheduler.clone()),
        viewer: VIEWER,
        settings: SessionSettings::default(),
    };
    (ctx, repo, scheduler)
}
