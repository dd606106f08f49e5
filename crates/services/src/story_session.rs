//! # Story Session Controller
//!
//! Owns one viewing pass over an ordered set of stories: the active index,
//! per-story progress, pause and media-readiness state, and the single timer
//! handle that drives auto-advance.
//!
//! The timer only runs while the session is open, not paused, and the current
//! story's media is ready. Every (re)start bumps a generation counter and ticks
//! from any other generation are dropped, so a cancelled timer can never move
//! a session that has already navigated or closed.

use std::sync::Arc;
use std::time::Duration;

use domains::errors::{DomainError, DomainResult};
use domains::models::{Story, UserId};
use domains::ports::{StoryRepository, Tick, TickScheduler, TimerHandle};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::navigation::{self, NavAction, NavInput, DEFAULT_SWIPE_THRESHOLD};

pub const DEFAULT_STORY_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub story_duration: Duration,
    /// Start every newly active story in [`MediaState::Loading`] so the
    /// presentation layer must `release()` it once media is ready.
    pub hold_on_activate: bool,
    pub swipe_threshold: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            story_duration: DEFAULT_STORY_DURATION,
            hold_on_activate: false,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
        }
    }
}

/// Collaborators injected into every session.
#[derive(Clone)]
pub struct SessionContext {
    pub repo: Arc<dyn StoryRepository>,
    pub scheduler: Arc<dyn TickScheduler>,
    pub viewer: UserId,
    pub settings: SessionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Navigated forward from the last story.
    PastEnd,
    /// Navigated back from the first story.
    BeforeStart,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Active,
    Closed(CloseReason),
}

impl SessionSignal {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MediaState {
    Loading,
    Ready,
    Failed { reason: String },
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub story: Story,
    pub active_index: usize,
    pub total: usize,
    pub progress_fraction: f64,
    pub paused: bool,
    pub media: MediaState,
    pub closed: Option<CloseReason>,
}

pub struct StorySession {
    ctx: SessionContext,
    stories: Vec<Story>,
    active_index: usize,
    progress: f64,
    paused: bool,
    media: MediaState,
    timer: Option<TimerHandle>,
    generation: u64,
    // latched once the current story's progress reaches 1
    completion_fired: bool,
    closed: Option<CloseReason>,
}

impl StorySession {
    /// Opens a session at `start_index` (clamped to 0 when out of range) and
    /// records the first view.
    ///
    /// Returns [`DomainError::EmptyStorySet`] for an empty sequence; the caller
    /// must not render anything in that case. A failing view record aborts the
    /// open and leaves nothing behind.
    pub async fn open(ctx: SessionContext, stories: Vec<Story>, start_index: usize) -> DomainResult<Self> {
        if stories.is_empty() {
            debug!("refusing to open a session without stories");
            return Err(DomainError::EmptyStorySet);
        }

        let index = if start_index < stories.len() { start_index } else { 0 };
        let media = initial_media(&ctx.settings);

        let mut session = Self {
            ctx,
            stories,
            active_index: index,
            progress: 0.0,
            paused: false,
            media,
            timer: None,
            generation: 0,
            completion_fired: false,
            closed: None,
        };

        let viewer = session.ctx.viewer;
        let first = session.stories[index].id;
        let seen = session.ctx.repo.record_view(first, viewer).await?;
        session.stories[index] = seen;
        session.restart_timer();

        info!(
            story_id = %first,
            index,
            total = session.stories.len(),
            viewer = %viewer,
            "story session opened"
        );
        Ok(session)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn current_story(&self) -> &Story {
        &self.stories[self.active_index]
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn progress_fraction(&self) -> f64 {
        self.progress
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn media(&self) -> &MediaState {
        &self.media
    }

    /// The failure reported for the current story's media, if any.
    pub fn media_error(&self) -> Option<DomainError> {
        match &self.media {
            MediaState::Failed { reason } => Some(DomainError::MediaLoadFailure(reason.clone())),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.closed
    }

    pub fn signal(&self) -> SessionSignal {
        match self.closed {
            Some(reason) => SessionSignal::Closed(reason),
            None => SessionSignal::Active,
        }
    }

    /// Generation of the running timer, `None` while stopped.
    pub fn timer_generation(&self) -> Option<u64> {
        self.timer.as_ref().map(TimerHandle::generation)
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            story: self.current_story().clone(),
            active_index: self.active_index,
            total: self.stories.len(),
            progress_fraction: self.progress,
            paused: self.paused,
            media: self.media.clone(),
            closed: self.closed,
        }
    }

    /// Moves to the next story, or closes the session from the last one.
    pub async fn advance(&mut self) -> DomainResult<SessionSignal> {
        if self.closed.is_some() {
            return Ok(self.signal());
        }
        if self.active_index + 1 >= self.stories.len() {
            return Ok(self.finish(CloseReason::PastEnd));
        }
        self.move_to(self.active_index + 1).await
    }

    /// Moves to the previous story, or closes the session from the first one.
    pub async fn retreat(&mut self) -> DomainResult<SessionSignal> {
        if self.closed.is_some() {
            return Ok(self.signal());
        }
        if self.active_index == 0 {
            return Ok(self.finish(CloseReason::BeforeStart));
        }
        self.move_to(self.active_index - 1).await
    }

    /// Pausing freezes progress where the last tick left it; resuming
    /// continues from that fraction instead of starting the story over.
    pub fn toggle_pause(&mut self) -> SessionSignal {
        if self.closed.is_some() {
            return self.signal();
        }
        self.paused = !self.paused;
        if self.paused {
            self.stop_timer();
            debug!(index = self.active_index, progress = self.progress, "session paused");
        } else {
            self.restart_timer();
            debug!(index = self.active_index, progress = self.progress, "session resumed");
        }
        self.signal()
    }

    /// Adds `viewer` to the current story's viewers through the repository.
    /// The local copy is replaced with what the repository returns. Does
    /// nothing once the session is closed.
    pub async fn record_view(&mut self, viewer: UserId) -> DomainResult<()> {
        if self.closed.is_some() {
            return Ok(());
        }
        let id = self.current_story().id;
        let updated = self.ctx.repo.record_view(id, viewer).await?;
        self.stories[self.active_index] = updated;
        Ok(())
    }

    /// Applies a timer tick. Ticks from a cancelled or superseded timer are
    /// ignored. Crossing the end of the story advances exactly once.
    ///
    /// If that advance fails the story keeps its previous progress and the
    /// timer stops; resuming (or `release()`) starts it again and retries.
    pub async fn on_timer_tick(&mut self, tick: Tick) -> DomainResult<SessionSignal> {
        if self.closed.is_some() {
            return Ok(self.signal());
        }
        if self.timer_generation() != Some(tick.generation) {
            trace!(generation = tick.generation, "dropping stale tick");
            return Ok(SessionSignal::Active);
        }
        if self.completion_fired {
            return Ok(SessionSignal::Active);
        }

        let duration = self.ctx.settings.story_duration.as_secs_f64();
        let fraction = if duration > 0.0 {
            tick.elapsed.as_secs_f64() / duration
        } else {
            1.0
        };
        let previous = self.progress;
        self.progress = fraction.clamp(0.0, 1.0);

        if fraction >= 1.0 {
            self.completion_fired = true;
            debug!(index = self.active_index, "story finished, advancing");
            return match self.advance().await {
                Ok(signal) => Ok(signal),
                Err(err) => {
                    self.progress = previous;
                    self.completion_fired = false;
                    self.stop_timer();
                    warn!(%err, index = self.active_index, "auto-advance failed, timer stopped");
                    Err(err)
                }
            };
        }
        Ok(SessionSignal::Active)
    }

    /// Defers the timer until the current story's media is ready.
    pub fn hold_until_ready(&mut self) -> SessionSignal {
        if self.closed.is_some() {
            return self.signal();
        }
        self.media = MediaState::Loading;
        self.stop_timer();
        self.signal()
    }

    /// Media is ready; starts the timer unless paused.
    pub fn release(&mut self) -> SessionSignal {
        if self.closed.is_some() {
            return self.signal();
        }
        self.media = MediaState::Ready;
        self.restart_timer();
        self.signal()
    }

    /// Records a media failure. The timer stays stopped so the story never
    /// auto-advances on broken media; navigation keeps working.
    pub fn media_failed(&mut self, reason: impl Into<String>) -> SessionSignal {
        if self.closed.is_some() {
            return self.signal();
        }
        let reason = reason.into();
        warn!(story_id = %self.current_story().id, %reason, "story media failed to load");
        self.media = MediaState::Failed { reason };
        self.stop_timer();
        self.signal()
    }

    /// Closes the session and cancels its timer before returning. Idempotent.
    pub fn close(&mut self) -> SessionSignal {
        if self.closed.is_some() {
            return self.signal();
        }
        self.finish(CloseReason::Explicit)
    }

    /// Routes a presentation-layer input through the navigation mapping.
    pub async fn dispatch(&mut self, input: NavInput) -> DomainResult<SessionSignal> {
        match navigation::resolve(input, self.ctx.settings.swipe_threshold) {
            Some(NavAction::Advance) => self.advance().await,
            Some(NavAction::Retreat) => self.retreat().await,
            Some(NavAction::Close) => Ok(self.close()),
            Some(NavAction::TogglePause) => Ok(self.toggle_pause()),
            None => Ok(self.signal()),
        }
    }

    // The view is recorded before any local state changes so a failing
    // repository leaves index, progress and timer exactly as they were.
    async fn move_to(&mut self, index: usize) -> DomainResult<SessionSignal> {
        let target = self.stories[index].id;
        let updated = self.ctx.repo.record_view(target, self.ctx.viewer).await?;

        self.stop_timer();
        self.stories[index] = updated;
        self.active_index = index;
        self.progress = 0.0;
        self.completion_fired = false;
        self.media = initial_media(&self.ctx.settings);
        self.restart_timer();

        debug!(story_id = %target, index, "moved to story");
        Ok(SessionSignal::Active)
    }

    fn finish(&mut self, reason: CloseReason) -> SessionSignal {
        self.stop_timer();
        self.closed = Some(reason);
        info!(?reason, index = self.active_index, "story session closed");
        SessionSignal::Closed(reason)
    }

    fn stop_timer(&mut self) {
        if let Some(mut handle) = self.timer.take() {
            handle.cancel();
        }
    }

    fn restart_timer(&mut self) {
        self.stop_timer();
        let runnable = self.closed.is_none()
            && !self.paused
            && !self.completion_fired
            && self.media == MediaState::Ready;
        if !runnable {
            return;
        }
        self.generation += 1;
        let offset = self.ctx.settings.story_duration.mul_f64(self.progress);
        self.timer = Some(self.ctx.scheduler.start(self.generation, offset));
    }
}

impl Drop for StorySession {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

fn initial_media(settings: &SessionSettings) -> MediaState {
    if settings.hold_on_activate {
        MediaState::Loading
    } else {
        MediaState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use domains::models::{story_ttl, MediaKind, StoryId};
    use domains::ports::MockStoryRepository;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingScheduler {
        started: Mutex<Vec<(u64, Duration)>>,
        cancelled: Arc<Mutex<Vec<u64>>>,
    }

    impl RecordingScheduler {
        fn starts(&self) -> Vec<(u64, Duration)> {
            self.started.lock().unwrap().clone()
        }

        fn cancelled(&self) -> Vec<u64> {
            self.cancelled.lock().unwrap().clone()
        }
    }

    impl TickScheduler for RecordingScheduler {
        fn start(&self, generation: u64, offset: Duration) -> TimerHandle {
            self.started.lock().unwrap().push((generation, offset));
            let cancelled = self.cancelled.clone();
            TimerHandle::new(generation, move || cancelled.lock().unwrap().push(generation))
        }
    }

    fn story(id: i64) -> Story {
        let created_at = Utc::now() - ChronoDuration::hours(1);
        Story {
            id: StoryId(id),
            owner_id: UserId(10),
            media_url: format!("https://cdn.example.com/{id}.jpg"),
            media_kind: MediaKind::Image,
            caption: None,
            created_at,
            expires_at: created_at + story_ttl(),
            viewer_ids: BTreeSet::new(),
        }
    }

    fn echo_repo(stories: &[Story], views: Arc<AtomicUsize>) -> MockStoryRepository {
        let known = stories.to_vec();
        let mut repo = MockStoryRepository::new();
        repo.expect_record_view().returning(move |id, viewer| {
            views.fetch_add(1, Ordering::SeqCst);
            let mut story = known
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(DomainError::StoryNotFound(id))?;
            story.add_viewer(viewer);
            Ok(story)
        });
        repo
    }

    fn ctx(repo: MockStoryRepository, scheduler: Arc<RecordingScheduler>) -> SessionContext {
        SessionContext {
            repo: Arc::new(repo),
            scheduler,
            viewer: UserId(1),
            settings: SessionSettings::default(),
        }
    }

    fn tick(session: &StorySession, millis: u64) -> Tick {
        Tick {
            generation: session.timer_generation().unwrap_or(0),
            elapsed: Duration::from_millis(millis),
        }
    }

    #[tokio::test]
    async fn empty_sequence_never_opens() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let result = StorySession::open(ctx(MockStoryRepository::new(), scheduler.clone()), vec![], 0).await;
        assert!(matches!(result, Err(DomainError::EmptyStorySet)));
        assert!(scheduler.starts().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_start_is_clamped_to_zero() {
        let stories = vec![story(1), story(2)];
        let views = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(RecordingScheduler::default());
        let session = StorySession::open(ctx(echo_repo(&stories, views.clone()), scheduler), stories, 9)
            .await
            .unwrap();
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.progress_fraction(), 0.0);
        assert_eq!(views.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn advance_resets_progress_and_restarts_timer() {
        let stories = vec![story(1), story(2)];
        let views = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(ctx(echo_repo(&stories, views.clone()), scheduler.clone()), stories, 0)
            .await
            .unwrap();

        let t = tick(&session, 2500);
        session.on_timer_tick(t).await.unwrap();
        assert_eq!(session.progress_fraction(), 0.5);

        let signal = session.advance().await.unwrap();
        assert_eq!(signal, SessionSignal::Active);
        assert_eq!(session.active_index(), 1);
        assert_eq!(session.progress_fraction(), 0.0);
        assert!(session.current_story().viewed_by(UserId(1)));
        assert_eq!(views.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.starts(), vec![(1, Duration::ZERO), (2, Duration::ZERO)]);
        assert_eq!(scheduler.cancelled(), vec![1]);
    }

    #[tokio::test]
    async fn pause_freezes_and_resume_continues_from_fraction() {
        let stories = vec![story(1)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(
            ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler.clone()),
            stories,
            0,
        )
        .await
        .unwrap();

        let t = tick(&session, 1000);
        session.on_timer_tick(t).await.unwrap();
        session.toggle_pause();
        assert!(session.is_paused());
        assert!(!session.timer_running());

        // A late tick from the cancelled timer must not move progress.
        session.on_timer_tick(t).await.unwrap();
        assert_eq!(session.progress_fraction(), 0.2);

        session.toggle_pause();
        assert_eq!(session.progress_fraction(), 0.2);
        assert_eq!(scheduler.starts().last(), Some(&(2, Duration::from_millis(1000))));

        let resumed = tick(&session, 1500);
        session.on_timer_tick(resumed).await.unwrap();
        assert_eq!(session.progress_fraction(), 0.3);
    }

    #[tokio::test]
    async fn repeated_ticks_past_the_end_advance_once() {
        let stories = vec![story(1), story(2), story(3)];
        let views = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(ctx(echo_repo(&stories, views.clone()), scheduler), stories, 0)
            .await
            .unwrap();

        let first = tick(&session, 5000);
        session.on_timer_tick(first).await.unwrap();
        // Same frame, same (now stale) generation.
        session.on_timer_tick(first).await.unwrap();
        session.on_timer_tick(Tick { elapsed: Duration::from_millis(5200), ..first }).await.unwrap();

        assert_eq!(session.active_index(), 1);
        assert_eq!(views.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_view_record_leaves_state_untouched() {
        let stories = vec![story(1), story(2)];
        let mut repo = MockStoryRepository::new();
        let mut calls = 0;
        let first = stories[0].clone();
        repo.expect_record_view().returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(first.clone())
            } else {
                Err(DomainError::Internal("storage offline".into()))
            }
        });
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(ctx(repo, scheduler), stories, 0).await.unwrap();
        let t = tick(&session, 1000);
        session.on_timer_tick(t).await.unwrap();
        let generation = session.timer_generation();

        let err = session.advance().await.unwrap_err();
        assert_eq!(err, DomainError::Internal("storage offline".into()));
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.progress_fraction(), 0.2);
        assert_eq!(session.timer_generation(), generation);
    }

    #[tokio::test]
    async fn held_media_defers_timer_until_release() {
        let stories = vec![story(1), story(2)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut context = ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler.clone());
        context.settings.hold_on_activate = true;
        let mut session = StorySession::open(context, stories, 0).await.unwrap();

        assert_eq!(session.media(), &MediaState::Loading);
        assert!(scheduler.starts().is_empty());

        session.release();
        assert!(session.timer_running());

        session.media_failed("404");
        assert!(!session.timer_running());
        assert_eq!(session.media_error(), Some(DomainError::MediaLoadFailure("404".into())));

        // Navigation still works and the next story is held again.
        session.advance().await.unwrap();
        assert_eq!(session.active_index(), 1);
        assert_eq!(session.media(), &MediaState::Loading);
        assert!(!session.timer_running());
    }

    #[tokio::test]
    async fn close_cancels_timer_and_is_idempotent() {
        let stories = vec![story(1), story(2)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(
            ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler.clone()),
            stories,
            1,
        )
        .await
        .unwrap();
        let late = tick(&session, 6000);

        assert_eq!(session.close(), SessionSignal::Closed(CloseReason::Explicit));
        assert_eq!(scheduler.cancelled(), vec![1]);
        assert_eq!(session.close(), SessionSignal::Closed(CloseReason::Explicit));
        assert_eq!(scheduler.cancelled(), vec![1]);

        let after = session.on_timer_tick(late).await.unwrap();
        assert_eq!(after, SessionSignal::Closed(CloseReason::Explicit));
        assert_eq!(session.active_index(), 1);
    }

    #[tokio::test]
    async fn media_failure_stops_the_timer_but_not_navigation() {
        let stories = vec![story(1), story(2)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(
            ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler.clone()),
            stories,
            0,
        )
        .await
        .unwrap();

        session.media_failed("decode error");
        assert!(!session.timer_running());
        assert_eq!(session.media_error(), Some(DomainError::MediaLoadFailure("decode error".into())));

        assert_eq!(session.advance().await.unwrap(), SessionSignal::Active);
        assert_eq!(session.active_index(), 1);
        assert_eq!(session.media(), &MediaState::Ready);
        assert_eq!(session.media_error(), None);
        assert_eq!(scheduler.starts().last().map(|(generation, _)| *generation), Some(2));
    }

    #[tokio::test]
    async fn hold_mid_story_resumes_from_frozen_progress() {
        let stories = vec![story(1), story(2)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(
            ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler.clone()),
            stories,
            0,
        )
        .await
        .unwrap();
        let t = tick(&session, 2000);
        session.on_timer_tick(t).await.unwrap();

        session.hold_until_ready();
        assert_eq!(session.media(), &MediaState::Loading);
        assert!(!session.timer_running());
        assert_eq!(scheduler.cancelled(), vec![1]);

        session.toggle_pause();
        session.release();
        assert_eq!(session.media(), &MediaState::Ready);
        assert!(!session.timer_running());
        assert_eq!(scheduler.starts().len(), 1);

        session.toggle_pause();
        assert_eq!(scheduler.starts().last(), Some(&(2, Duration::from_secs(2))));
        assert_eq!(session.progress_fraction(), 0.4);
    }

    #[tokio::test]
    async fn snapshot_reflects_session_state() {
        let stories = vec![story(1), story(2)];
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(
            ctx(echo_repo(&stories, Arc::new(AtomicUsize::new(0))), scheduler),
            stories,
            1,
        )
        .await
        .unwrap();
        let t = tick(&session, 1000);
        session.on_timer_tick(t).await.unwrap();
        session.toggle_pause();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.story.id, StoryId(2));
        assert!(snapshot.story.viewed_by(UserId(1)));
        assert_eq!(snapshot.active_index, 1);
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.progress_fraction, 0.2);
        assert!(snapshot.paused);
        assert_eq!(snapshot.media, MediaState::Ready);
        assert_eq!(snapshot.closed, None);

        session.close();
        assert_eq!(session.snapshot().closed, Some(CloseReason::Explicit));
    }

    #[tokio::test]
    async fn record_view_after_close_does_not_touch_the_repository() {
        let stories = vec![story(1)];
        let views = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut session = StorySession::open(ctx(echo_repo(&stories, views.clone()), scheduler), stories, 0)
            .await
            .unwrap();
        session.close();

        session.record_view(UserId(7)).await.unwrap();
        assert_eq!(views.load(Ordering::SeqCst), 1);
        assert!(!session.current_story().viewed_by(UserId(7)));
    }
}
