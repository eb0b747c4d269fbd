use serde::Serialize;

/// The travel record of a vehicle that has left the simulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletedRecord {
    /// The vehicle's ID.
    id: String,
    /// The simulation time at which the vehicle was first seen, in s.
    enter_time: f64,
    /// The simulation time at which the vehicle was first missing, in s.
    exit_time: f64,
    /// The time spent in the simulation, in s.
    travel_time: f64,
    /// The last known speed in m/s, or 0 if it could no longer be read.
    speed: f64,
}

impl CompletedRecord {
    /// Creates a record. The caller guarantees that `exit_time >= enter_time`.
    pub(crate) fn new(id: String, enter_time: f64, exit_time: f64, speed: f64) -> Self {
        Self {
            id,
            enter_time,
            exit_time,
            travel_time: exit_time - enter_time,
            speed,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn enter_time(&self) -> f64 {
        self.enter_time
    }

    pub fn exit_time(&self) -> f64 {
        self.exit_time
    }

    /// Gets the travel time in s.
    pub fn travel_time(&self) -> f64 {
        self.travel_time
    }

    /// Gets the speed at the exit step in m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }
}
