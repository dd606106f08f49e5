//! # Core Traits (Ports)
//!
//! Collaborators the story services depend on. Every adapter crate implements
//! one or more of these; sessions and services receive them as injected
//! handles rather than reaching for shared global state.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;
use crate::models::{NewStory, Story, StoryId, StoryPatch, User, UserId};

/// Persistence contract for stories and their view records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn get_by_id(&self, id: StoryId) -> DomainResult<Option<Story>>;
    async fn list_by_user(&self, owner: UserId) -> DomainResult<Vec<Story>>;
    /// Stories with `created_at` strictly after `cutoff`.
    async fn list_created_after(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Story>>;

    /// Persists a new story and assigns the next id.
    async fn create(&self, story: NewStory, created_at: DateTime<Utc>) -> DomainResult<Story>;
    async fn update(&self, id: StoryId, patch: StoryPatch) -> DomainResult<Story>;
    async fn delete(&self, id: StoryId) -> DomainResult<Story>;

    /// Adds `viewer` to the story's viewer set. Idempotent.
    async fn record_view(&self, id: StoryId, viewer: UserId) -> DomainResult<Story>;
    async fn viewers(&self, id: StoryId) -> DomainResult<Vec<UserId>>;
}

/// Read-only user lookups.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn get_by_username(&self, username: &str) -> DomainResult<Option<User>>;
}

/// Wall-clock source, injectable so expiry rules are testable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Progress report delivered by a [`TickScheduler`] to the host.
///
/// `elapsed` counts from the start of the current story, so a timer that was
/// started with an offset reports `offset + time since start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
    pub elapsed: Duration,
}

/// Host timing primitive. `start` begins delivering [`Tick`]s tagged with
/// `generation` until the returned handle is cancelled or dropped.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TickScheduler: Send + Sync {
    fn start(&self, generation: u64, offset: Duration) -> TimerHandle;
}

/// Owned handle to a running timer. Cancelling is synchronous and idempotent;
/// dropping the handle cancels it.
pub struct TimerHandle {
    generation: u64,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(generation: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            generation,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel, for schedulers that need no teardown.
    pub fn detached(generation: u64) -> Self {
        Self {
            generation,
            cancel: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("generation", &self.generation)
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}
