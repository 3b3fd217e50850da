//! Resilient client library for the repatlas API.
//!
//! Implements the data-availability fallback chain and the real-time /
//! polling synchronization layer:
//!
//! - [`remote::RemoteStore`] — HTTP accessor against the hosted API.
//! - [`feed::ChangeFeed`] — push-or-poll change subscriptions behind one
//!   `subscribe` / `cancel` contract.
//! - [`poller::PollingEngine`] — fingerprint-gated polling fallback.
//! - [`cache::CacheStore`] — persistent last-known-good mirror plus a
//!   pending-changes log for offline mutations.
//! - [`collection::ResilientCollection`] — the generic
//!   remote → cache → bundled-defaults accessor.
//! - [`leads::LeadForwarder`] — fire-and-forget lead webhook delivery.
//!
//! Nothing here is a global: construct [`config::SyncConfig`] at the
//! composition root and pass the pieces down explicitly.

pub mod cache;
pub mod collection;
pub mod config;
pub mod feed;
pub mod leads;
pub mod poller;
pub mod remote;
