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

use crate::dut::DividerDut;
use crate::error::{Error, Result};
use crate::ports::Edge;
use crate::SimTime;

/// Puts the divider in a known state: reset asserted, divisor 0, input
/// clock running from its low phase, then reset released on a rising edge
/// of the input clock.
///
/// The 1.2 period delay keeps the reset release away from the clock phase
/// the clock was started in. Calling this again on the same DUT restarts
/// the input clock rather than adding a second one.
pub fn setup(dut: &mut DividerDut, clock_period: SimTime) -> Result<()> {
    if clock_period == 0 {
        return Err(Error::InvalidClockPeriod(clock_period));
    }
    dut.set_reset(true)?;
    dut.program_divisor(0)?;
    let clk_src = dut.clk_src();
    let sim = dut.sim_mut();
    sim.start_clock(clk_src, clock_period, false)?;
    sim.wait_for(clock_period * 6 / 5)?;
    sim.wait_edge(clk_src, Edge::Rising)?;
    dut.set_reset(false)?;
    log::trace!("Reset released @{}", dut.sim().now());
    Ok(())
}
