//! The operations the observer needs from a running simulation.

use crate::Result;
use log::warn;
use std::ops::{Deref, DerefMut};

/// The result of asking the simulator for a vehicle's speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpeedReading {
    /// The vehicle's instantaneous speed in m/s.
    Speed(f64),
    /// The simulator no longer knows about the vehicle.
    Unavailable,
}

impl SpeedReading {
    /// Gets the speed, or `fallback` if it could not be read.
    pub fn unwrap_or(self, fallback: f64) -> f64 {
        match self {
            SpeedReading::Speed(speed) => speed,
            SpeedReading::Unavailable => fallback,
        }
    }
}

/// A step-by-step control channel to a traffic simulation.
///
/// Every method blocks until the simulator answers. Errors are fatal to the run,
/// apart from a vehicle that can no longer be queried, which is reported as
/// [SpeedReading::Unavailable].
pub trait SimulationControl {
    /// Advances the simulation by one step.
    fn step(&mut self) -> Result<()>;

    /// Gets the IDs of the vehicles currently in the network.
    fn vehicle_ids(&mut self) -> Result<Vec<String>>;

    /// Gets the current simulation time in s.
    fn time(&mut self) -> Result<f64>;

    /// Gets the number of vehicles which are in the network or still waiting to depart.
    fn min_expected_vehicles(&mut self) -> Result<i32>;

    /// Gets the instantaneous speed of a vehicle.
    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<SpeedReading>;

    /// Ends the simulation and releases the connection.
    fn close(&mut self) -> Result<()>;
}

impl<C: SimulationControl + ?Sized> SimulationControl for &mut C {
    fn step(&mut self) -> Result<()> {
        (**self).step()
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>> {
        (**self).vehicle_ids()
    }

    fn time(&mut self) -> Result<f64> {
        (**self).time()
    }

    fn min_expected_vehicles(&mut self) -> Result<i32> {
        (**self).min_expected_vehicles()
    }

    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<SpeedReading> {
        (**self).vehicle_speed(vehicle_id)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Owns a simulation connection and closes it exactly once,
/// either through [Session::close] or when dropped.
pub struct Session<C: SimulationControl> {
    control: C,
    closed: bool,
}

impl<C: SimulationControl> Session<C> {
    /// Takes ownership of an open connection.
    pub fn new(control: C) -> Self {
        Self {
            control,
            closed: false,
        }
    }

    /// Closes the connection, reporting any failure to do so.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.control.close()
    }
}

impl<C: SimulationControl> Deref for Session<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.control
    }
}

impl<C: SimulationControl> DerefMut for Session<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.control
    }
}

impl<C: SimulationControl> Drop for Session<C> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(err) = self.control.close() {
                warn!("Failed to close the simulation: {}", err);
            }
        }
    }
}
