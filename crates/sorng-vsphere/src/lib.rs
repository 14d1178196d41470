//! # SortOfRemote NG – vSphere Driver Core
//!
//! The parts of a vSphere hypervisor driver that build VM configuration
//! payloads and resolve managed-object references through the paged
//! property collector.
//!
//! ## Modules
//!
//! - **types** — Shared data structures (object refs, property pages, inputs, query results)
//! - **error** — Crate-specific error types
//! - **config** — Driver configuration
//! - **transport** — Property-collector transport trait
//! - **datastore_path** — `[datastore] path` codec
//! - **device_keys** — Provisional device key allocator
//! - **devices** — Virtual devices, backings and hardware list inspection
//! - **spec** — Payload records and their kind tags
//! - **builder** — Config-spec builders
//! - **resolver** — Paged cursor walking (find-first, full scan)
//! - **queries** — VM / host / datastore / cluster lookups
//! - **service** — Aggregate driver façade + shared state alias

pub mod types;
pub mod error;
pub mod config;
pub mod transport;
pub mod datastore_path;
pub mod device_keys;
pub mod devices;
pub mod spec;
pub mod builder;
pub mod resolver;
pub mod queries;
pub mod service;
