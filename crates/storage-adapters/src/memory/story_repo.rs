//! # In-memory story store
//!
//! `DashMap`-backed implementation of `StoryRepository`. Each instance is an
//! explicitly owned handle; share it with `Arc`, never through globals.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::errors::{DomainError, DomainResult};
use domains::models::{story_ttl, MediaKind, NewStory, Story, StoryId, StoryPatch, UserId};
use domains::ports::StoryRepository;
use tracing::debug;

use crate::latency::SimulatedLatency;

pub struct InMemoryStoryRepo {
    stories: DashMap<StoryId, Story>,
    /// Highest id handed out so far; new ids continue from here.
    last_id: AtomicI64,
    latency: SimulatedLatency,
}

impl InMemoryStoryRepo {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self {
            stories: DashMap::new(),
            last_id: AtomicI64::new(0),
            latency,
        }
    }

    /// Pre-populates the store. Later `create` calls continue after the
    /// largest seeded id.
    pub fn with_stories<I>(stories: I, latency: SimulatedLatency) -> Self
    where
        I: IntoIterator<Item = Story>,
    {
        let repo = Self::new(latency);
        let mut max_id = 0;
        for story in stories {
            max_id = max_id.max(story.id.0);
            repo.stories.insert(story.id, story);
        }
        repo.last_id.store(max_id, Ordering::SeqCst);
        repo
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    fn collect_sorted<F>(&self, keep: F) -> Vec<Story>
    where
        F: Fn(&Story) -> bool,
    {
        let mut out: Vec<Story> = self
            .stories
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepo {
    async fn get_by_id(&self, id: StoryId) -> DomainResult<Option<Story>> {
        self.latency.before_read().await;
        Ok(self.stories.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_by_user(&self, owner: UserId) -> DomainResult<Vec<Story>> {
        self.latency.before_read().await;
        Ok(self.collect_sorted(|s| s.owner_id == owner))
    }

    async fn list_created_after(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Story>> {
        self.latency.before_list().await;
        Ok(self.collect_sorted(|s| s.created_at > cutoff))
    }

    async fn create(&self, story: NewStory, created_at: DateTime<Utc>) -> DomainResult<Story> {
        self.latency.before_write().await;
        let media_kind = story
            .media_kind
            .or_else(|| MediaKind::guess_from_url(&story.media_url))
            .ok_or_else(|| DomainError::Validation(format!("unknown media kind for '{}'", story.media_url)))?;

        let id = StoryId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created = Story {
            id,
            owner_id: story.owner_id,
            media_url: story.media_url,
            media_kind,
            caption: story.caption,
            created_at,
            expires_at: created_at + story_ttl(),
            viewer_ids: BTreeSet::new(),
        };
        self.stories.insert(id, created.clone());
        debug!(story_id = %id, "stored new story");
        Ok(created)
    }

    async fn update(&self, id: StoryId, patch: StoryPatch) -> DomainResult<Story> {
        self.latency.before_write().await;
        let mut entry = self.stories.get_mut(&id).ok_or(DomainError::StoryNotFound(id))?;
        let story = entry.value_mut();
        if let Some(url) = patch.media_url {
            story.media_url = url;
        }
        if let Some(caption) = patch.caption {
            story.caption = if caption.is_empty() { None } else { Some(caption) };
        }
        Ok(story.clone())
    }

    async fn delete(&self, id: StoryId) -> DomainResult<Story> {
        self.latency.before_write().await;
        self.stories
            .remove(&id)
            .map(|(_, story)| story)
            .ok_or(DomainError::StoryNotFound(id))
    }

    async fn record_view(&self, id: StoryId, viewer: UserId) -> DomainResult<Story> {
        self.latency.before_write().await;
        let mut entry = self.stories.get_mut(&id).ok_or(DomainError::StoryNotFound(id))?;
        if entry.value_mut().add_viewer(viewer) {
            debug!(story_id = %id, viewer = %viewer, "view recorded");
        }
        Ok(entry.value().clone())
    }

    async fn viewers(&self, id: StoryId) -> DomainResult<Vec<UserId>> {
        self.latency.before_read().await;
        self.stories
            .get(&id)
            .map(|entry| entry.value().viewer_ids.iter().copied().collect())
            .ok_or(DomainError::StoryNotFound(id))
    }
}
