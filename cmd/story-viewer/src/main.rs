//! # Story Viewer Binary
//!
//! Headless host for the story session: wires the in-memory store and the
//! tokio timer into the services, prints the story strip for the configured
//! viewer, then plays one owner's stories to the end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use configs::{LogFormat, Settings};
use domains::errors::DomainError;
use domains::models::UserId;
use domains::ports::{StoryRepository, Tick, UserRepository};
use services::{CloseReason, SessionRequest, SessionSettings, SessionSignal, StoryService, ViewerSession};
use storage_adapters::{InMemoryStoryRepo, InMemoryUserRepo, SimulatedLatency};
use timing_adapters::{SystemClock, TokioTickScheduler};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "story-viewer", about = "Play a user's active stories against the in-memory store")]
struct Cli {
    /// Settings file; missing files are ignored.
    #[arg(long, default_value = configs::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Username whose stories to play. Defaults to the first ring in the strip.
    #[arg(long)]
    owner: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Settings and logging
    let settings = Settings::load_from(Some(&cli.config)).context("loading settings")?;
    init_tracing(&settings);

    // 2. Storage
    let latency = SimulatedLatency::from_millis(
        settings.store.read_latency_ms,
        settings.store.list_latency_ms,
        settings.store.write_latency_ms,
    );
    let (stories, users) = build_store(&settings, latency)?;
    let stories: Arc<dyn StoryRepository> = Arc::new(stories);
    let users: Arc<dyn UserRepository> = Arc::new(users);

    // 3. Timer and services
    let (scheduler, mut ticks) = TokioTickScheduler::new(settings.session.tick_interval(), Handle::current());
    let session_settings = SessionSettings {
        story_duration: settings.session.story_duration(),
        hold_on_activate: settings.session.hold_on_activate,
        swipe_threshold: settings.session.swipe_threshold,
    };
    let service = StoryService::new(
        stories,
        users.clone(),
        Arc::new(SystemClock),
        Arc::new(scheduler),
        session_settings,
    );

    // 4. Story strip
    let viewer = UserId(settings.viewer.viewer_id);
    let rings = service.story_rings(viewer).await.context("listing story rings")?;
    if rings.is_empty() {
        info!("no active stories to show");
        return Ok(());
    }
    for ring in &rings {
        info!(
            owner = %ring.owner.username,
            stories = ring.stories.len(),
            unseen = ring.has_unseen,
            "story ring"
        );
    }

    // 5. Play one owner's stories
    let owner = match cli.owner.as_deref() {
        Some(username) => users
            .get_by_username(username)
            .await?
            .with_context(|| format!("unknown user '{username}'"))?
            .id,
        None => rings[0].owner.id,
    };

    let request = SessionRequest {
        owner,
        viewer,
        start_index: 0,
    };
    let opened = match service.open_session(request).await {
        Ok(opened) => opened,
        Err(DomainError::EmptyStorySet) => {
            info!(owner = %owner, "nothing to show");
            return Ok(());
        }
        Err(err) => return Err(err).context("opening story session"),
    };

    let played: Vec<_> = opened.session.stories().iter().map(|s| s.id).collect();
    let reason = play(opened, &mut ticks, settings.session.hold_on_activate).await?;
    info!(?reason, "viewer closed");

    for id in played {
        let viewers = service.viewers(id).await?;
        info!(story_id = %id, views = viewers.len(), "view count");
    }
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    match settings.log.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[cfg(feature = "fixtures")]
fn build_store(settings: &Settings, latency: SimulatedLatency) -> anyhow::Result<(InMemoryStoryRepo, InMemoryUserRepo)> {
    if settings.store.seed_fixtures {
        return storage_adapters::fixtures::seeded_repos(chrono::Utc::now(), latency).context("seeding fixtures");
    }
    Ok(empty_store(latency))
}

#[cfg(not(feature = "fixtures"))]
fn build_store(settings: &Settings, latency: SimulatedLatency) -> anyhow::Result<(InMemoryStoryRepo, InMemoryUserRepo)> {
    if settings.store.seed_fixtures {
        warn!("built without fixtures; starting with an empty store");
    }
    Ok(empty_store(latency))
}

fn empty_store(latency: SimulatedLatency) -> (InMemoryStoryRepo, InMemoryUserRepo) {
    (InMemoryStoryRepo::new(latency), InMemoryUserRepo::new(Vec::new(), latency))
}

/// Drives the session from timer ticks until it closes or Ctrl-C arrives.
/// Media is treated as ready the moment a story becomes active.
async fn play(
    opened: ViewerSession,
    ticks: &mut UnboundedReceiver<Tick>,
    hold_on_activate: bool,
) -> anyhow::Result<CloseReason> {
    let ViewerSession { owner, mut session } = opened;
    info!(owner = %owner.username, total = session.len(), "playing stories");

    if hold_on_activate {
        session.release();
    }
    let mut shown = session.active_index();

    loop {
        let tick = tokio::select! {
            tick = ticks.recv() => tick.context("timer channel closed")?,
            _ = tokio::signal::ctrl_c() => {
                session.close();
                return Ok(CloseReason::Explicit);
            }
        };

        match session.on_timer_tick(tick).await {
            Ok(SessionSignal::Closed(reason)) => return Ok(reason),
            Ok(SessionSignal::Active) => {}
            Err(err) => {
                warn!(%err, "could not advance; closing viewer");
                session.close();
                return Ok(CloseReason::Explicit);
            }
        }

        if session.active_index() != shown {
            shown = session.active_index();
            let snapshot = session.snapshot();
            info!(
                index = snapshot.active_index,
                total = snapshot.total,
                story_id = %snapshot.story.id,
                kind = %snapshot.story.media_kind,
                caption = snapshot.story.caption.as_deref().unwrap_or(""),
                "showing story"
            );
            if hold_on_activate {
                session.release();
            }
        }
    }
}
