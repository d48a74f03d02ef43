//! Host sessions and multi-host orchestration.
//!
//! The driver layer provides the main API: a [`HostSession`] per
//! controller, and [`run`]/[`dispatch`] to drive many of them at once.

mod builder;
mod credentials;
mod directory;
#[cfg(test)]
pub(crate) mod mock;
pub mod orchestrator;
mod response;
mod session;

pub use builder::SessionBuilder;
pub use credentials::Credentials;
pub use directory::{HostDirectory, HostRecord, StaticDirectory};
pub use orchestrator::{InboundCommand, RunOptions, dispatch, run};
pub use response::HostResponse;
pub use session::{HostSession, SessionState, TerminalSettings};
