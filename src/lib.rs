//! Newton-Raphson AC load flow.
//!
//! A case is a list of [`Bus`]es, the bus admittance matrix (see
//! [`make_ybus`]) and the list of [`Line`]s used for flow reporting.
//! [`runpf`] validates the case, solves it and returns an [`LFResult`].

mod bus;
mod debug;
mod error;
mod injection;
mod lfopt;
mod limits;
mod newton;
mod partition;
mod pfresult;
mod pfsoln;
mod runpf;
mod state;
mod ybus;

pub use bus::*;
pub use error::ConfigError;
pub use lfopt::LFOpt;
pub use newton::{LogProgress, ProgressMonitor};
pub use partition::BusOrder;
pub use pfresult::*;
pub use runpf::*;
pub use ybus::make_ybus;
