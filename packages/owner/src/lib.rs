//! PlotInfo owner service - Resolve land register owners from GBDBS.
//!
//! This crate queries a cantonal land register service (GBDBS 2.1) for a
//! parcel identified by its EGRID and resolves who ultimately holds the
//! ownership rights: individuals, communities of persons, or other parcels
//! (condominium units and co-ownership shares).
//!
//! # Example
//!
//! ```
//! use plotinfo_owner::config;
//!
//! // EGRIDs are validated before any request is built
//! assert!(config::validate_egrid("CH207506973252").is_ok());
//! assert!(config::validate_egrid("CH2075").is_err());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration, constants and EGRID validation
//! - [`error`]: Error types and Result alias
//! - [`http`]: Blocking HTTP client shared by all upstream calls
//! - [`xml`]: Namespace-insensitive XML navigation
//! - [`types`]: Registry records and ownership summary types
//! - [`extract`]: Record extraction from registry responses
//! - [`format`]: Address, parcel label and ownership form formatting
//! - [`resolver`]: Ownership resolution
//! - [`registry`]: GBDBS registry client
//! - [`captcha`]: reCAPTCHA verification
//! - [`service`]: Captcha-gated owner info and client response types
//! - [`server`]: HTTP surface
//! - [`cli`]: Command-line interface

pub mod captcha;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod http;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod service;
pub mod types;
pub mod xml;

// Re-export commonly used items
pub use config::OwnerConfig;
pub use error::{OwnerError, Result};
pub use registry::RegistryClient;
pub use resolver::{OwnershipResolver, ParcelSource};
pub use service::{OwnerInfoResponse, OwnershipDisplay, PlotOwnerService};
pub use types::{BeneficiaryEntry, OwnershipSummary, RegistryRecords};
