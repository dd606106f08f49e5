//! Bundled demo data.
//!
//! Story ages are stored relative to seeding time so the set always contains
//! a mix of active and expired stories, whenever it is loaded.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use domains::models::{story_ttl, MediaKind, Story, StoryId, User, UserId};
use serde::Deserialize;
use thiserror::Error;

use crate::latency::SimulatedLatency;
use crate::memory::{InMemoryStoryRepo, InMemoryUserRepo};

const USERS_JSON: &str = include_str!("../fixtures/users.json");
const STORIES_JSON: &str = include_str!("../fixtures/stories.json");

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("malformed {name} fixture: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct StoryFixture {
    id: i64,
    owner_id: i64,
    media_url: String,
    media_kind: MediaKind,
    caption: Option<String>,
    age_minutes: i64,
    #[serde(default)]
    viewer_ids: Vec<i64>,
}

impl StoryFixture {
    fn into_story(self, now: DateTime<Utc>) -> Story {
        let created_at = now - Duration::minutes(self.age_minutes);
        Story {
            id: StoryId(self.id),
            owner_id: UserId(self.owner_id),
            media_url: self.media_url,
            media_kind: self.media_kind,
            caption: self.caption,
            created_at,
            expires_at: created_at + story_ttl(),
            viewer_ids: self.viewer_ids.into_iter().map(UserId).collect::<BTreeSet<_>>(),
        }
    }
}

pub fn users() -> Result<Vec<User>, FixtureError> {
    serde_json::from_str(USERS_JSON).map_err(|source| FixtureError::Parse { name: "users", source })
}

/// Stories with `created_at` rebased onto `now`.
pub fn stories(now: DateTime<Utc>) -> Result<Vec<Story>, FixtureError> {
    let raw: Vec<StoryFixture> =
        serde_json::from_str(STORIES_JSON).map_err(|source| FixtureError::Parse { name: "stories", source })?;
    Ok(raw.into_iter().map(|f| f.into_story(now)).collect())
}

/// Both repositories, seeded and ready to be wrapped in `Arc`s.
pub fn seeded_repos(
    now: DateTime<Utc>,
    latency: SimulatedLatency,
) -> Result<(InMemoryStoryRepo, InMemoryUserRepo), FixtureError> {
    let stories = InMemoryStoryRepo::with_stories(stories(now)?, latency);
    let users = InMemoryUserRepo::new(users()?, latency);
    tracing::info!(stories = stories.len(), users = users.len(), "seeded in-memory store");
    Ok((stories, users))
}
