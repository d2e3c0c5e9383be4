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

//! The fixed signal interface of a programmable clock divider.

use crate::error::{Error, Result};
use crate::ports::{Direction, SignalId};
use crate::sim::{Device, Simulator};

pub const CLK_SRC: &str = "clk_src";
pub const RST_N: &str = "rst_n";
pub const DIV_CTRL: &str = "div_ctrl";
pub const CLK_OUT: &str = "clk_out";
pub const DIV_CTRL_SIZE_P: &str = "DIV_CTRL_SIZE_P";

/// Handle on a simulated divider, resolved once from its signal names.
pub struct DividerDut {
    sim: Simulator,
    clk_src: SignalId,
    rst_n: SignalId,
    div_ctrl: SignalId,
    clk_out: SignalId,
    div_ctrl_width: usize,
}

impl DividerDut {
    pub fn new(device: Box<dyn Device>) -> Result<Self> {
        Self::attach(Simulator::new(device)?)
    }

    /// Binds to an elaborated simulation; fails if any of the divider's
    /// signals or its width parameter is missing or has the wrong shape.
    pub fn attach(sim: Simulator) -> Result<Self> {
        let clk_src = sim.signal(CLK_SRC)?;
        let rst_n = sim.signal(RST_N)?;
        let div_ctrl = sim.signal(DIV_CTRL)?;
        let clk_out = sim.signal(CLK_OUT)?;
        for id in &[clk_src, rst_n, div_ctrl] {
            if sim.bus().get(*id).direction() != Direction::Input {
                return Err(Error::NotAnInput(sim.bus().get(*id).name().to_string()));
            }
        }
        let div_ctrl_width = sim.parameter(DIV_CTRL_SIZE_P)? as usize;
        if sim.bus().get(div_ctrl).width() != div_ctrl_width {
            log::warn!(
                "{} is {} bit(s) wide but {} = {}",
                DIV_CTRL,
                sim.bus().get(div_ctrl).width(),
                DIV_CTRL_SIZE_P,
                div_ctrl_width
            );
        }
        log::debug!(
            "Attached to divider {} with {} = {}",
            sim.device_name(),
            DIV_CTRL_SIZE_P,
            div_ctrl_width
        );
        Ok(Self {
            sim,
            clk_src,
            rst_n,
            div_ctrl,
            clk_out,
            div_ctrl_width,
        })
    }

    pub fn sim(&self) -> &Simulator {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    pub fn clk_src(&self) -> SignalId {
        self.clk_src
    }

    pub fn rst_n(&self) -> SignalId {
        self.rst_n
    }

    pub fn div_ctrl(&self) -> SignalId {
        self.div_ctrl
    }

    pub fn clk_out(&self) -> SignalId {
        self.clk_out
    }

    pub fn div_ctrl_width(&self) -> usize {
        self.div_ctrl_width
    }

    /// The largest divisor representable on `div_ctrl`: 2^W - 1.
    pub fn max_divisor(&self) -> u64 {
        crate::ports::mask(self.div_ctrl_width)
    }

    /// `asserted` drives the active-low reset to 0.
    pub fn set_reset(&mut self, asserted: bool) -> Result<()> {
        let rst_n = self.rst_n;
        self.sim.drive(rst_n, if asserted { 0 } else { 1 })
    }

    pub fn program_divisor(&mut self, divisor: u64) -> Result<()> {
        if divisor > self.max_divisor() {
            return Err(Error::DivisorOutOfRange {
                divisor,
                max: self.max_divisor(),
            });
        }
        let div_ctrl = self.div_ctrl;
        log::trace!("Programming divisor {} @{}", divisor, self.sim.now());
        self.sim.drive(div_ctrl, divisor)
    }

    pub fn divisor(&self) -> u64 {
        self.sim.read(self.div_ctrl)
    }
}
