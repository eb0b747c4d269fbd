use crate::control::{SimulationControl, SpeedReading};
use crate::record::CompletedRecord;
use crate::{Error, Result};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The speed recorded for a vehicle whose speed could not be read when it exited.
pub const FALLBACK_SPEED: f64 = 0.0;

/// Tracks when vehicles enter and leave a running simulation.
#[derive(Default)]
pub struct Observer {
    /// The entry time of every vehicle currently in the simulation.
    active: HashMap<String, f64>,
    /// The vehicles that have left, in exit order.
    records: Vec<CompletedRecord>,
    /// The number of steps taken.
    steps: usize,
    /// The simulation time after the most recent step.
    time: f64,
    /// Set from another thread to stop the run before the next step.
    interrupt: Option<Arc<AtomicBool>>,
}

/// The result of running a simulation to completion.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// The vehicles that left the simulation, in exit order.
    pub records: Vec<CompletedRecord>,
    /// Vehicles still reported as present when the simulation stopped,
    /// with their entry times, ordered by ID.
    pub unfinished: Vec<(String, f64)>,
    /// The number of steps taken.
    pub steps: usize,
    /// The simulation time when the run ended, in s.
    pub final_time: f64,
}

impl Observer {
    /// Creates a new observer.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates an observer that stops with [Error::Interrupted] once `flag` is set.
    pub fn with_interrupt(flag: Arc<AtomicBool>) -> Self {
        Self {
            interrupt: Some(flag),
            ..Default::default()
        }
    }

    /// Steps the simulation until no vehicles are present or waiting to depart.
    pub fn run<C: SimulationControl>(mut self, sim: &mut C) -> Result<RunOutcome> {
        while sim.min_expected_vehicles()? > 0 {
            if self.interrupted() {
                return Err(Error::Interrupted);
            }
            self.observe_step(sim)?;
        }
        info!(
            "Simulation finished after {} steps at t={}",
            self.steps, self.time
        );

        let unfinished = self
            .active
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect_vec();
        if !unfinished.is_empty() {
            warn!(
                "{} vehicles were still present when the simulation ended; they are not counted",
                unfinished.len()
            );
        }

        Ok(RunOutcome {
            records: self.records,
            unfinished,
            steps: self.steps,
            final_time: self.time,
        })
    }

    /// Advances the simulation by one step and accounts for the vehicles that entered or left.
    pub fn observe_step<C: SimulationControl>(&mut self, sim: &mut C) -> Result<()> {
        sim.step()?;
        self.steps += 1;
        let current: HashSet<String> = sim.vehicle_ids()?.into_iter().collect();
        let now = sim.time()?;
        self.time = now;
        trace!("Step {}: t={}, {} vehicles", self.steps, now, current.len());

        for id in &current {
            if !self.active.contains_key(id) {
                debug!("Vehicle '{}' entered at t={}", id, now);
                self.active.insert(id.clone(), now);
            }
        }

        let exited: SmallVec<[String; 8]> = self
            .active
            .keys()
            .filter(|id| !current.contains(*id))
            .cloned()
            .sorted()
            .collect();

        for id in exited {
            let Some(&entry) = self.active.get(&id) else {
                continue;
            };
            // Written this way so that a NaN time is rejected too.
            if !(now >= entry) {
                return Err(Error::NegativeDuration {
                    id,
                    entry,
                    exit: now,
                });
            }
            let speed = match sim.vehicle_speed(&id)? {
                SpeedReading::Speed(speed) => speed,
                SpeedReading::Unavailable => {
                    debug!("Speed of '{}' unavailable at exit", id);
                    FALLBACK_SPEED
                }
            };
            debug!("Vehicle '{}' exited at t={} after {} s", id, now, now - entry);
            self.active.remove(&id);
            self.records.push(CompletedRecord::new(id, entry, now, speed));
        }

        Ok(())
    }

    /// Gets the number of vehicles currently being tracked.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Gets the entry time of a tracked vehicle.
    pub fn entry_time(&self, id: &str) -> Option<f64> {
        self.active.get(id).copied()
    }

    /// Gets the records of the vehicles that have left so far.
    pub fn records(&self) -> &[CompletedRecord] {
        &self.records
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::SeqCst))
    }
}
