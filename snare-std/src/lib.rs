//! # snare-std
//!
//! Standard implementations for the Snare member hooking framework.
//!
//! This crate provides:
//! - **Dispatch bridge**: [`HookBridge`](bridge::HookBridge), turning host
//!   load notifications into per-process contexts and author callbacks
//! - **Contexts**: [`ContextRegistry`](bridge::ContextRegistry) and
//!   [`LoadDeduplicator`](bridge::LoadDeduplicator)
//! - **Hook handles**: [`HookHandle`](bridge::HookHandle), [`HookSet`](bridge::HookSet)
//! - **Reporting**: [`TracingReporter`](reporting::TracingReporter)
//! - **Testing**: in-memory scope, software engine and recording reporter

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use snare_core;

// Modules
pub mod bridge;
pub mod reporting;
pub mod testing;
