//! Adapters implementing the domain ports against concrete backends.

pub mod in_memory;
pub mod redis;
