//! Observes a SUMO traffic simulation over TraCI and summarizes vehicle travel times.
//!
//! The [Observer] steps a [SimulationControl] implementation (normally a [TraciClient])
//! until no vehicles remain, recording when each vehicle enters and leaves.
//! The resulting [CompletedRecord]s are summarized by [TravelTimeStats].

pub use config::SimulatorConfig;
pub use control::{Session, SimulationControl, SpeedReading};
pub use error::{Error, Result};
pub use observer::{Observer, RunOutcome, FALLBACK_SPEED};
pub use record::CompletedRecord;
pub use report::{write_json, write_report, TravelTimeStats, NO_DATA};
pub use traci::TraciClient;

mod config;
mod control;
mod error;
mod observer;
mod record;
mod report;
mod traci;
