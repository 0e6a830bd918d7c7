//! # Supervisor
//!
//! Pipeline assembly and lifecycle.
//!
//! Responsibilities:
//! - Compile every route's translation plan once (`build_plans`)
//! - One output queue + dispatcher per active target
//! - One router per topic, bound to its target's queue
//! - Orderly shutdown: routers → queue drain → dispatchers
//!
//! ## Usage Example
//!
//! ```ignore
//! use supervisor::{build_plans, Supervisor, SupervisorSettings};
//!
//! let mut supervisor = Supervisor::new(SupervisorSettings::from(&config.pipeline));
//! supervisor.add_output(OutputTarget::Internet, sender)?;
//! for plan in build_plans(&config)? {
//!     supervisor.add_route(plan, source)?;
//! }
//! let report = supervisor.run().await;
//! ```

mod error;
mod plan;
mod report;
mod supervisor;

pub use error::SupervisorError;
pub use plan::build_plans;
pub use report::PipelineReport;
pub use supervisor::{Supervisor, SupervisorSettings};
