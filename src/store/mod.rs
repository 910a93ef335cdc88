//! Database access for check metrics
//!
//! The plugin never talks to the MongoDB driver directly. It asks a
//! [`StoreConnector`] for a [`CheckStore`] once per run and issues the count
//! queries through it, so tests and alternative hosts can swap the backend.
//!
//! ## Backends
//!
//! - **MongoDB** (default): `mongo::MongoConnector`, backed by the official driver
//! - **In-Memory**: `memory::MemoryConnector`, for tests and dry runs

pub mod backend;
pub mod memory;
pub mod mongo;
pub mod uri;

pub use backend::{CheckStore, StoreConnector};
pub use uri::{normalize_server_uri, redact_credentials};
