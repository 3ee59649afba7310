//! Language Server runtime for a declarative UI markup language.
//!
//! Wires the core crates (registry, environment, indexer, coordinator,
//! completion) into a message loop driven over stdio. The binary entry
//! point ([`main.rs`](../src/main.rs)) is a thin CLI wrapper around
//! [`Server`].

pub mod capabilities;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod server;

pub use server::Server;
