/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// An individual based epidemic model. A well-mixed population is stepped one day
// at a time until nobody is infectious any more.
//
////////////////////////////////////////////////////////////////////////////////////

pub mod data_management;
pub mod error;
pub mod logging;
pub mod policy;
pub mod simulation;
pub mod stats;
pub mod transition;
pub mod utilities;
pub mod world;

pub use error::OutbreakError;
pub use policy::{DemographicPolicy, FatalityPolicy, TransmissionPolicy};
pub use simulation::{run, run_from_entropy, run_seeded, SimParms, Simulation};
pub use stats::{ReportRow, RunResult, RunSummary};
pub use transition::{DailyRecord, IllnessTimeline};
