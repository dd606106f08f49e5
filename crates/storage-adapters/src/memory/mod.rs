//! In-memory adapters. State lives only as long as the owning handle.

mod story_repo;
mod user_repo;

pub use story_repo::InMemoryStoryRepo;
pub use user_repo::InMemoryUserRepo;
