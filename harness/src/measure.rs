// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Edge-driven period measurement.

use crate::error::{Error, Result};
use crate::ports::{Edge, SignalId};
use crate::sim::Simulator;
use crate::time::to_ns;
use crate::SimTime;

/// One output clock cycle, as observed between two rising edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodMeasurement {
    /// Rising edge opening the cycle.
    pub rising: SimTime,
    pub falling: SimTime,
    /// Rising edge closing the cycle.
    pub next_rising: SimTime,
}

impl PeriodMeasurement {
    /// Full period in ns.
    pub fn full_period(&self) -> f64 {
        to_ns(self.next_rising - self.rising)
    }

    /// High phase in ns.
    pub fn half_period(&self) -> f64 {
        to_ns(self.falling - self.rising)
    }
}

/// Measures the cycle starting at the next rising edge of `signal`.
pub fn measure(sim: &mut Simulator, signal: SignalId) -> Result<PeriodMeasurement> {
    let rising = sim.wait_edge(signal, Edge::Rising)?;
    measure_from(sim, signal, rising)
}

/// Measures the cycle opened by the rising edge the caller just waited for
/// at `rising`.
pub fn measure_from(
    sim: &mut Simulator,
    signal: SignalId,
    rising: SimTime,
) -> Result<PeriodMeasurement> {
    let falling = sim.wait_edge(signal, Edge::Falling)?;
    let next_rising = sim.wait_edge(signal, Edge::Rising)?;
    let measurement = PeriodMeasurement {
        rising,
        falling,
        next_rising,
    };
    log::debug!(
        "{}: full period {} ns, half period {} ns",
        sim.bus().get(signal).name(),
        measurement.full_period(),
        measurement.half_period()
    );
    Ok(measurement)
}

/// Waits `settle_edges` rising edges of `signal`, so a cycle still running
/// at the old setting is never measured, and measures the cycle opened by
/// the last of them. With `trailing_cycle` one more rising edge is awaited
/// afterwards, which only makes waveform dumps easier to read.
pub fn capture(
    sim: &mut Simulator,
    signal: SignalId,
    settle_edges: usize,
    trailing_cycle: bool,
) -> Result<PeriodMeasurement> {
    if settle_edges == 0 {
        return Err(Error::InvalidSettleEdges);
    }
    for _ in 1..settle_edges {
        sim.wait_edge(signal, Edge::Rising)?;
    }
    let measurement = measure(sim, signal)?;
    if trailing_cycle {
        sim.wait_edge(signal, Edge::Rising)?;
    }
    Ok(measurement)
}
