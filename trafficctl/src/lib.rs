//! # trafficctl
//!
//! Async multi-vendor client for traffic-light controllers.
//!
//! trafficctl reads the state of a signalized intersection and selects its
//! signal stage, whatever the controller underneath speaks: SNMP in the
//! STCIP and UG405 dialects, a scraped web control panel, or an
//! interactive SSH terminal. Every reply is normalized into one field set
//! with an inferred operating mode.
//!
//! ## Features
//!
//! - Swarco, Potok-P, Potok-S and Peek controllers
//! - SNMP v2c via async-snmp, HTTP via reqwest, SSH via russh
//! - UG405 site control number (SCN) resolution, cached per session
//! - Operating-mode and light-status inference per vendor
//! - Bounded concurrent fan-out with per-host timeouts and failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trafficctl::{Credentials, Operation, RunOptions, SessionBuilder, Vendor};
//! use trafficctl::transport::NetTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trafficctl::Error> {
//!     let transport = Arc::new(NetTransport::new()?);
//!     let credentials = Credentials::new().with_stcip("public", "private");
//!
//!     let sessions = vec![
//!         SessionBuilder::new(Vendor::Swarco, "10.45.154.11")
//!             .credentials(credentials.clone())
//!             .build(Arc::clone(&transport))?,
//!         SessionBuilder::new(Vendor::PotokS, "10.45.154.16")
//!             .credentials(credentials)
//!             .build(Arc::clone(&transport))?,
//!     ];
//!
//!     let results = trafficctl::run(Operation::GetState, &sessions, &RunOptions::default()).await;
//!     for (host, response) in &results {
//!         println!("{host}: {:?} {:?}", response.get("current_mode"), response.errors);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod driver;
pub mod error;
pub mod parser;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use codec::Operation;
pub use driver::{
    Credentials, HostDirectory, HostRecord, HostResponse, HostSession, InboundCommand, RunOptions,
    SessionBuilder, StaticDirectory, dispatch, run,
};
pub use error::{Error, ErrorRecord};
pub use parser::{FieldValue, NormalizedStateMap};
pub use platform::{LightStatus, Mode, ProtocolFamily, Vendor};
pub use transport::{NetTransport, Transport};
