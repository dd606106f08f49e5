//! Active-story filtering and per-owner grouping.
//!
//! Expiry is always recomputed from `created_at` against the caller's `now`;
//! the stored `expires_at` is never consulted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domains::models::{story_ttl, Story, UserId};

/// Anything created at or before this instant has expired.
pub fn activity_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - story_ttl()
}

/// Keeps stories created strictly after the cutoff, oldest first.
pub fn filter_active<I>(stories: I, now: DateTime<Utc>) -> Vec<Story>
where
    I: IntoIterator<Item = Story>,
{
    let cutoff = activity_cutoff(now);
    let mut active: Vec<Story> = stories
        .into_iter()
        .filter(|s| s.created_at > cutoff)
        .collect();
    sort_chronologically(&mut active);
    active
}

/// Oldest first; ids break ties so equal timestamps keep creation order.
pub fn sort_chronologically(stories: &mut [Story]) {
    stories.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// True when `viewer` has not seen at least one of `stories`.
pub fn has_unseen(stories: &[Story], viewer: UserId) -> bool {
    stories.iter().any(|s| !s.viewed_by(viewer))
}

/// One owner's active stories as handed to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerStories {
    pub owner_id: UserId,
    /// Chronological, oldest first.
    pub stories: Vec<Story>,
    pub has_unseen: bool,
}

impl OwnerStories {
    pub fn latest_at(&self) -> Option<DateTime<Utc>> {
        self.stories.last().map(|s| s.created_at)
    }
}

/// Groups active stories by owner. Owners without an active story are absent.
///
/// Groups with unseen stories come first, then the most recently updated
/// owner; owner id is the final tie-breaker.
pub fn group_active_by_owner<I>(stories: I, now: DateTime<Utc>, viewer: UserId) -> Vec<OwnerStories>
where
    I: IntoIterator<Item = Story>,
{
    let mut by_owner: BTreeMap<UserId, Vec<Story>> = BTreeMap::new();
    for story in filter_active(stories, now) {
        by_owner.entry(story.owner_id).or_default().push(story);
    }

    let mut groups: Vec<OwnerStories> = by_owner
        .into_iter()
        .map(|(owner_id, stories)| OwnerStories {
            owner_id,
            has_unseen: has_unseen(&stories, viewer),
            stories,
        })
        .collect();

    groups.sort_by(|a, b| {
        b.has_unseen
            .cmp(&a.has_unseen)
            .then(b.latest_at().cmp(&a.latest_at()))
            .then(a.owner_id.cmp(&b.owner_id))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domains::models::{MediaKind, StoryId};
    use std::collections::BTreeSet;

    fn story(id: i64, owner: i64, hours_ago: i64, now: DateTime<Utc>) -> Story {
        let created_at = now - Duration::hours(hours_ago);
        Story {
            id: StoryId(id),
            owner_id: UserId(owner),
            media_url: format!("https://cdn.example.com/{id}.jpg"),
            media_kind: MediaKind::Image,
            caption: None,
            created_at,
            expires_at: created_at + story_ttl(),
            viewer_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn keeps_last_two_of_three_in_chronological_order() {
        let now = Utc::now();
        let stories = vec![story(3, 1, 1, now), story(1, 1, 30, now), story(2, 1, 10, now)];
        let active = filter_active(stories, now);
        let ids: Vec<i64> = active.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn exactly_at_cutoff_is_expired() {
        let now = Utc::now();
        assert!(filter_active(vec![story(1, 1, 24, now)], now).is_empty());
    }

    #[test]
    fn owners_with_only_expired_stories_do_not_qualify() {
        let now = Utc::now();
        let stories = vec![story(1, 1, 30, now), story(2, 2, 2, now)];
        let groups = group_active_by_owner(stories, now, UserId(99));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owner_id, UserId(2));
    }

    #[test]
    fn unseen_groups_sort_first() {
        let now = Utc::now();
        let viewer = UserId(99);
        let mut seen = story(1, 1, 1, now);
        seen.add_viewer(viewer);
        let unseen = story(2, 2, 5, now);
        let groups = group_active_by_owner(vec![seen, unseen], now, viewer);
        assert_eq!(groups[0].owner_id, UserId(2));
        assert!(groups[0].has_unseen);
        assert!(!groups[1].has_unseen);
    }

    #[test]
    fn one_unseen_story_marks_the_owner() {
        let now = Utc::now();
        let viewer = UserId(5);
        let mut a = story(1, 1, 3, now);
        a.add_viewer(viewer);
        let b = story(2, 1, 2, now);
        assert!(has_unseen(&[a.clone(), b], viewer));
        assert!(!has_unseen(&[a], viewer));
    }
}
