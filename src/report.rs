//! Summary statistics over completed travel records.

use crate::observer::RunOutcome;
use crate::record::CompletedRecord;
use crate::Result;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Printed when no vehicle completed its trip.
pub const NO_DATA: &str = "No vehicle data collected.";

/// Aggregate travel-time figures for a set of completed vehicles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TravelTimeStats {
    /// The number of vehicles that completed their trip.
    pub count: usize,
    /// The mean travel time in s.
    pub mean: f64,
    /// The shortest travel time in s.
    pub min: f64,
    /// The longest travel time in s.
    pub max: f64,
    /// The mean exit speed in m/s, counting unreadable speeds as 0.
    pub mean_speed: f64,
}

impl TravelTimeStats {
    /// Computes the statistics, or `None` if there are no records.
    pub fn from_records(records: &[CompletedRecord]) -> Option<Self> {
        let (min, max) = match records
            .iter()
            .map(CompletedRecord::travel_time)
            .minmax_by(f64::total_cmp)
        {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(time) => (time, time),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let count = records.len();
        let total: f64 = records.iter().map(CompletedRecord::travel_time).sum();
        let total_speed: f64 = records.iter().map(CompletedRecord::speed).sum();
        Some(Self {
            count,
            mean: total / count as f64,
            min,
            max,
            mean_speed: total_speed / count as f64,
        })
    }
}

impl fmt::Display for TravelTimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "--- Travel Time Statistics ---")?;
        writeln!(f, "Total Vehicles Completed: {}", self.count)?;
        write!(f, "Average Travel Time: {:.2} s", self.mean)
    }
}

/// Prints the statistics block, or a notice if nothing completed.
pub fn write_report(records: &[CompletedRecord], out: &mut impl Write) -> io::Result<()> {
    match TravelTimeStats::from_records(records) {
        Some(stats) => writeln!(out, "{}", stats),
        None => writeln!(out, "{}", NO_DATA),
    }
}

#[derive(Serialize)]
struct Export<'a> {
    summary: Option<TravelTimeStats>,
    steps: usize,
    final_time: f64,
    records: &'a [CompletedRecord],
    unfinished: &'a [(String, f64)],
}

/// Writes the outcome of a run, with every record, as pretty-printed JSON.
/// The writer is flushed before returning.
pub fn write_json(outcome: &RunOutcome, mut out: impl Write) -> Result<()> {
    let export = Export {
        summary: TravelTimeStats::from_records(&outcome.records),
        steps: outcome.steps,
        final_time: outcome.final_time,
        records: &outcome.records,
        unfinished: &outcome.unfinished,
    };
    serde_json::to_writer_pretty(&mut out, &export)?;
    out.flush()?;
    Ok(())
}
