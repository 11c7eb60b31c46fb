//! Persistence collaborators: repository traits and the in-memory store.

pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::{CardRepository, SessionRepository};
