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

//! Pin-level stand-in for a programmable clock divider.
//!
//! Only the observable behavior is reproduced: divisor 0 bypasses the
//! divider, divisor 1 inverts the input clock, and any larger divisor `d`
//! toggles the output every `d` input edges, giving a period of `d` input
//! periods at 50% duty cycle. Faults can be injected to exercise the
//! harness' failure paths.

use crate::dut::{CLK_OUT, CLK_SRC, DIV_CTRL, DIV_CTRL_SIZE_P, RST_N};
use crate::error::Result;
use crate::ports::{PortDecl, SignalBus, SignalId, Transition};
use crate::sim::{Device, DeviceIo};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Divisors of 2 and up divide by one more than programmed.
    OffByOne,
    /// Divisors of 2 and up keep the right period but hold the output high
    /// one input half-cycle longer than low.
    SkewedDuty,
    /// The output freezes while this divisor is programmed.
    Stuck(u64),
}

impl Default for Fault {
    fn default() -> Self {
        Fault::None
    }
}

#[derive(Clone, Copy, Debug)]
struct Ports {
    clk_src: SignalId,
    rst_n: SignalId,
    div_ctrl: SignalId,
    clk_out: SignalId,
}

pub struct BehavioralDivider {
    width: usize,
    fault: Fault,
    ports: Option<Ports>,
    /// Input edges seen in the current output phase.
    count: u64,
}

impl BehavioralDivider {
    pub fn new(width: usize) -> Self {
        Self::with_fault(width, Fault::None)
    }

    pub fn with_fault(width: usize, fault: Fault) -> Self {
        assert!(width > 0 && width < 64, "Unsupported divider width {}", width);
        Self {
            width,
            fault,
            ports: None,
            count: 0,
        }
    }

    /// Input edges the output stays in its current `level` for.
    fn phase_length(&self, divisor: u64, level: u64) -> u64 {
        match self.fault {
            Fault::OffByOne => divisor + 1,
            Fault::SkewedDuty if level == 1 => divisor + 1,
            Fault::SkewedDuty => divisor - 1,
            _ => divisor,
        }
    }
}

impl Device for BehavioralDivider {
    fn name(&self) -> &str {
        "clock_divider"
    }

    fn ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::input(CLK_SRC, 1),
            PortDecl::input(RST_N, 1),
            PortDecl::input(DIV_CTRL, self.width),
            PortDecl::output(CLK_OUT, 1),
        ]
    }

    fn parameters(&self) -> Vec<(&'static str, u64)> {
        vec![(DIV_CTRL_SIZE_P, self.width as u64)]
    }

    fn elaborate(&mut self, bus: &SignalBus) -> Result<()> {
        self.ports = Some(Ports {
            clk_src: bus.lookup(CLK_SRC)?,
            rst_n: bus.lookup(RST_N)?,
            div_ctrl: bus.lookup(DIV_CTRL)?,
            clk_out: bus.lookup(CLK_OUT)?,
        });
        Ok(())
    }

    fn evaluate(&mut self, io: &mut DeviceIo<'_>, changed: Transition) {
        let ports = match self.ports {
            Some(ports) => ports,
            None => return,
        };
        // everything is sampled on input clock edges, both of them
        if changed.signal != ports.clk_src {
            return;
        }
        let clk = changed.new & 1;
        let divisor = io.get(ports.div_ctrl);
        if self.fault == Fault::Stuck(divisor) {
            return;
        }
        match divisor {
            0 => {
                self.count = 0;
                io.set(ports.clk_out, clk);
            }
            1 => {
                self.count = 0;
                io.set(ports.clk_out, clk ^ 1);
            }
            _ if io.get(ports.rst_n) == 0 => {
                self.count = 0;
                io.set(ports.clk_out, 0);
            }
            _ => {
                let level = io.get(ports.clk_out);
                self.count += 1;
                if self.count >= self.phase_length(divisor, level) {
                    self.count = 0;
                    io.set(ports.clk_out, level ^ 1);
                }
            }
        }
    }
}
