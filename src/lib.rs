//! Seawatch - Maritime situational awareness for vessel operators.
//!
//! # Overview
//!
//! Seawatch turns one snapshot of a vessel-tracking backend (vessels, ports,
//! position history, safety events, voyages) plus an operator's search query
//! into a situation report: the selected vessels with their track statistics,
//! risk classification against known hazards, and proximity alerts near ports.
//!
//! Report computation is a pure function of its inputs. The only clock is the
//! one carried by [`EngineConfig`], and the only timer lives in [`poller`].
//!
//! # Modules
//!
//! - [`geo`]: Great-circle distance and coordinate parsing
//! - [`model`]: Raw snapshot and validated domain types
//! - [`parser`]: Normalization of raw records into domain values
//! - [`filter`]: Operator query matching
//! - [`voyage`]: Track statistics per vessel
//! - [`risk`]: Hazard classification and port proximity alerts
//! - [`situation`]: Report assembly
//! - [`config`]: Engine and service settings
//! - [`data_sources`]: Tracking backend client
//! - [`poller`]: Periodic snapshot fetching
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod filter;
pub mod geo;
pub mod model;
pub mod parser;
pub mod poller;
pub mod risk;
pub mod situation;
pub mod voyage;

pub use config::EngineConfig;
pub use error::MsaeError;
pub use situation::{SituationReport, compute_situation};
