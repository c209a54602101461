//! Chat history adapters.

pub mod memory;

pub use memory::InMemoryChatRepository;
