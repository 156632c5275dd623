//! taskmirror — polls remote task lists and broadcasts snapshots to
//! dashboard consumers.
//!
//! The core is the fetch-and-cache coordinator: one [`fetch::ListFetcher`]
//! per tracked list with its own schedule and cache, a
//! [`fetch::FetcherRegistry`] enforcing one fetcher per list, and a
//! [`coordinator::Coordinator`] that aggregates every cache into a snapshot
//! and broadcasts it to any number of consumers.

pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod fetch;
pub mod model;
pub mod remote;
