//! # Story Service
//!
//! Orchestrates the repositories for everything around the viewer: creating
//! and editing stories, view bookkeeping, the story-ring strip, and opening
//! sessions with the right story subset.
//!
//! Repository calls are the source of truth; this layer only validates,
//! filters, and orders.

use std::sync::Arc;

use domains::errors::{DomainError, DomainResult};
use domains::models::{MediaKind, NewStory, Story, StoryId, StoryPatch, User, UserId};
use domains::ports::{Clock, StoryRepository, TickScheduler, UserRepository};
use tracing::{info, instrument, warn};

use crate::active_stories::{activity_cutoff, filter_active, group_active_by_owner};
use crate::story_session::{SessionContext, SessionSettings, StorySession};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A user with at least one active story, as shown in the story strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRing {
    pub owner: User,
    /// Chronological, oldest first.
    pub stories: Vec<Story>,
    pub has_unseen: bool,
}

/// What to open: whose stories, for whom, and where to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRequest {
    pub owner: UserId,
    pub viewer: UserId,
    pub start_index: usize,
}

/// An opened session together with the owner it belongs to.
pub struct ViewerSession {
    pub owner: User,
    pub session: StorySession,
}

pub struct StoryService {
    stories: Arc<dyn StoryRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TickScheduler>,
    settings: SessionSettings,
}

impl StoryService {
    pub fn new(
        stories: Arc<dyn StoryRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TickScheduler>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            stories,
            users,
            clock,
            scheduler,
            settings,
        }
    }

    /// Checks an upload before it is turned into a story.
    /// Only `image/*` and `video/*` up to [`MAX_UPLOAD_BYTES`] are accepted.
    pub fn validate_upload(content_type: &str, size_bytes: u64) -> DomainResult<MediaKind> {
        let kind = MediaKind::from_content_type(content_type).ok_or_else(|| {
            DomainError::Validation(format!("unsupported media type '{content_type}', expected an image or video"))
        })?;
        if size_bytes > MAX_UPLOAD_BYTES {
            return Err(DomainError::Validation(format!(
                "file is {size_bytes} bytes, the limit is {MAX_UPLOAD_BYTES}"
            )));
        }
        Ok(kind)
    }

    #[instrument(skip(self, input), fields(owner = %input.owner_id))]
    pub async fn create_story(&self, input: NewStory) -> DomainResult<Story> {
        let media_url = input.media_url.trim().to_string();
        if media_url.is_empty() {
            return Err(DomainError::Validation("media url is required".into()));
        }
        let kind = match input.media_kind {
            Some(kind) => kind,
            None => MediaKind::guess_from_url(&media_url).ok_or_else(|| {
                DomainError::Validation(format!("cannot tell whether '{media_url}' is an image or a video"))
            })?,
        };

        if self.users.get_by_id(input.owner_id).await?.is_none() {
            return Err(DomainError::UserNotFound(input.owner_id));
        }

        let story = NewStory {
            owner_id: input.owner_id,
            media_url,
            media_kind: Some(kind),
            caption: normalize_caption(input.caption),
        };
        let created = self.stories.create(story, self.clock.now()).await?;
        info!(story_id = %created.id, kind = %created.media_kind, "story created");
        Ok(created)
    }

    pub async fn get_story(&self, id: StoryId) -> DomainResult<Story> {
        self.stories
            .get_by_id(id)
            .await?
            .ok_or(DomainError::StoryNotFound(id))
    }

    pub async fn update_story(&self, id: StoryId, patch: StoryPatch) -> DomainResult<Story> {
        let media_url = match patch.media_url {
            Some(url) => {
                let url = url.trim().to_string();
                if url.is_empty() {
                    return Err(DomainError::Validation("media url cannot be blank".into()));
                }
                Some(url)
            }
            None => None,
        };
        let patch = StoryPatch {
            media_url,
            caption: patch.caption.map(|c| c.trim().to_string()),
        };
        self.stories.update(id, patch).await
    }

    pub async fn delete_story(&self, id: StoryId) -> DomainResult<Story> {
        let removed = self.stories.delete(id).await?;
        info!(story_id = %id, "story deleted");
        Ok(removed)
    }

    pub async fn mark_viewed(&self, id: StoryId, viewer: UserId) -> DomainResult<Story> {
        self.stories.record_view(id, viewer).await
    }

    pub async fn viewers(&self, id: StoryId) -> DomainResult<Vec<UserId>> {
        self.stories.viewers(id).await
    }

    /// Viewer profiles for a story; ids without a user record are skipped.
    pub async fn viewer_profiles(&self, id: StoryId) -> DomainResult<Vec<User>> {
        let mut profiles = Vec::new();
        for viewer in self.stories.viewers(id).await? {
            match self.users.get_by_id(viewer).await? {
                Some(user) => profiles.push(user),
                None => warn!(story_id = %id, viewer = %viewer, "viewer has no user record"),
            }
        }
        Ok(profiles)
    }

    /// All active stories, oldest first.
    pub async fn active_stories(&self) -> DomainResult<Vec<Story>> {
        let now = self.clock.now();
        let recent = self.stories.list_created_after(activity_cutoff(now)).await?;
        Ok(filter_active(recent, now))
    }

    /// One ring per user with an active story. Unseen rings come first.
    #[instrument(skip(self))]
    pub async fn story_rings(&self, viewer: UserId) -> DomainResult<Vec<StoryRing>> {
        let now = self.clock.now();
        let recent = self.stories.list_created_after(activity_cutoff(now)).await?;

        let mut rings = Vec::new();
        for group in group_active_by_owner(recent, now, viewer) {
            match self.users.get_by_id(group.owner_id).await? {
                Some(owner) => rings.push(StoryRing {
                    owner,
                    stories: group.stories,
                    has_unseen: group.has_unseen,
                }),
                None => warn!(owner = %group.owner_id, "skipping stories of unknown owner"),
            }
        }
        Ok(rings)
    }

    /// Opens a session over the owner's active stories.
    ///
    /// Fails with [`DomainError::EmptyStorySet`] when nothing is active and
    /// with [`DomainError::UserNotFound`] for an unknown owner.
    #[instrument(skip(self))]
    pub async fn open_session(&self, request: SessionRequest) -> DomainResult<ViewerSession> {
        let owner = self
            .users
            .get_by_id(request.owner)
            .await?
            .ok_or(DomainError::UserNotFound(request.owner))?;

        let now = self.clock.now();
        let stories = filter_active(self.stories.list_by_user(request.owner).await?, now);

        let ctx = SessionContext {
            repo: self.stories.clone(),
            scheduler: self.scheduler.clone(),
            viewer: request.viewer,
            settings: self.settings,
        };
        let session = StorySession::open(ctx, stories, request.start_index).await?;
        Ok(ViewerSession { owner, session })
    }
}

fn normalize_caption(caption: Option<String>) -> Option<String> {
    caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
