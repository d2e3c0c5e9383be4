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

//! Verification harness for a programmable clock divider.
//!
//! A small discrete-event kernel drives the divider's pins; bring-up,
//! measurement and tolerance checks are layered on top of it and combined
//! into test strategies.

mod bringup;
mod check;
mod config;
mod devices;
mod dut;
mod error;
mod measure;
mod ports;
mod sim;
mod strategy;
mod time;
mod vcd;

// Public types
// simulated time, in picoseconds
pub type SimTime = u64;

pub use crate::bringup::setup;
pub use crate::check::{ExpectedPeriod, Mismatch, Quantity, Tolerance, ToleranceChecker};
pub use crate::check::DEFAULT_RELATIVE_TOLERANCE;
pub use crate::config::{HarnessConfig, DEFAULT_SEED};
pub use crate::devices::{BehavioralDivider, Fault};
pub use crate::dut::{DividerDut, CLK_OUT, CLK_SRC, DIV_CTRL, DIV_CTRL_SIZE_P, RST_N};
pub use crate::error::{Error, Result};
pub use crate::measure::{capture, measure, measure_from, PeriodMeasurement};
pub use crate::ports::{mask, Direction, Edge, PortDecl, Signal, SignalBus, SignalId, Transition};
pub use crate::sim::{Device, DeviceIo, SimulationCallbacks, Simulator, DEFAULT_MAX_WAIT};
pub use crate::strategy::{CaseReport, Harness, RunReport, SoftFailure, Strategy};
pub use crate::time::{ns, to_ns, PS_PER_NS};
pub use crate::vcd::VcdWriter;
