//! Read-only user directory held in memory.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::errors::DomainResult;
use domains::models::{User, UserId};
use domains::ports::UserRepository;

use crate::latency::SimulatedLatency;

pub struct InMemoryUserRepo {
    users: DashMap<UserId, User>,
    latency: SimulatedLatency,
}

impl InMemoryUserRepo {
    pub fn new<I>(users: I, latency: SimulatedLatency) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            latency,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn get_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        self.latency.before_read().await;
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        self.latency.before_read().await;
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone()))
    }
}
