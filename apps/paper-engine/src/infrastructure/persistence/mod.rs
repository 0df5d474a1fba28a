//! Persistence Adapters
//!
//! Implementations of the order repository trait.

pub mod in_memory;

pub use in_memory::InMemoryOrderRepository;
