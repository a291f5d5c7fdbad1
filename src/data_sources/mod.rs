//! External data sources feeding the situation engine.
//!
//! # Data Sources
//!
//! - [`maritime`]: the tracking backend's REST API (vessels, ports, position
//!   history, safety events, voyages)
//!
//! Clients here only transport data. They return raw snapshots and never
//! interpret records; validation belongs to [`crate::parser`].

pub mod maritime;

pub use maritime::MaritimeApiClient;
