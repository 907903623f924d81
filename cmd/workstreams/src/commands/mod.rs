//! CLI commands module.

mod assign;
mod params;
mod recluster;
mod refresh;
mod util;

pub use assign::AssignCommand;
pub use params::ParamsCommand;
pub use recluster::ReclusterCommand;
pub use refresh::RefreshCommand;

pub(crate) use util::*;
