//! A scripted stand-in for a running simulator.

use std::collections::{HashMap, HashSet};
use traffic_observer::{Error, Result, SimulationControl, SpeedReading};

/// What the simulator reports after one step.
struct Frame {
    time: f64,
    vehicles: Vec<String>,
}

/// Replays a fixed sequence of frames, one per step.
#[derive(Default)]
pub struct ScriptedSimulation {
    frames: Vec<Frame>,
    /// The number of steps taken so far.
    steps: usize,
    speeds: HashMap<String, f64>,
    unavailable: HashSet<String>,
    /// Fail when asked to take this step (1-based).
    fail_at: Option<usize>,
    /// How many times `close` was called.
    pub closes: usize,
}

impl ScriptedSimulation {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds the state after the next step.
    pub fn frame(mut self, time: f64, vehicles: &[&str]) -> Self {
        self.frames.push(Frame {
            time,
            vehicles: vehicles.iter().map(|id| id.to_string()).collect(),
        });
        self
    }

    /// Sets the speed reported for a vehicle.
    pub fn speed(mut self, id: &str, speed: f64) -> Self {
        self.speeds.insert(id.into(), speed);
        self
    }

    /// Makes a vehicle's speed unreadable.
    pub fn unavailable(mut self, id: &str) -> Self {
        self.unavailable.insert(id.into());
        self
    }

    /// Makes the given step fail.
    pub fn fail_at(mut self, step: usize) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn current(&self) -> Result<&Frame> {
        self.steps
            .checked_sub(1)
            .and_then(|idx| self.frames.get(idx))
            .ok_or_else(|| Error::Protocol("no step taken".into()))
    }
}

impl SimulationControl for ScriptedSimulation {
    fn step(&mut self) -> Result<()> {
        if self.fail_at == Some(self.steps + 1) {
            return Err(Error::Protocol("connection reset".into()));
        }
        if self.steps >= self.frames.len() {
            return Err(Error::Protocol("stepped past the end".into()));
        }
        self.steps += 1;
        Ok(())
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>> {
        Ok(self.current()?.vehicles.clone())
    }

    fn time(&mut self) -> Result<f64> {
        Ok(self.current()?.time)
    }

    fn min_expected_vehicles(&mut self) -> Result<i32> {
        Ok((self.frames.len() - self.steps) as i32)
    }

    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<SpeedReading> {
        if self.unavailable.contains(vehicle_id) {
            return Ok(SpeedReading::Unavailable);
        }
        Ok(SpeedReading::Speed(
            self.speeds.get(vehicle_id).copied().unwrap_or(1.0),
        ))
    }

    fn close(&mut self) -> Result<()> {
        self.closes += 1;
        Ok(())
    }
}
