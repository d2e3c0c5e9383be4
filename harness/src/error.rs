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

use std::fmt;

use crate::check::Mismatch;
use crate::ports::Edge;
use crate::SimTime;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    UnknownSignal(String),
    UnknownParameter(String),
    NotAnInput(String),
    ValueOutOfRange {
        signal: String,
        value: u64,
        width: usize,
    },
    DivisorOutOfRange {
        divisor: u64,
        max: u64,
    },
    InvalidClockPeriod(SimTime),
    InvalidSettleEdges,
    WaitTimeout {
        signal: Option<String>,
        edge: Option<Edge>,
        waited: SimTime,
    },
    SimulationStalled(SimTime),
    OutOfTolerance(Mismatch),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownSignal(name) => write!(f, "ERROR: No signal named {}", name),
            Self::UnknownParameter(name) => write!(f, "ERROR: No parameter named {}", name),
            Self::NotAnInput(name) => {
                write!(f, "ERROR: Signal {} is not an input and can't be driven", name)
            }
            Self::ValueOutOfRange {
                signal,
                value,
                width,
            } => write!(
                f,
                "ERROR: Value {} does not fit the {} bit(s) of signal {}",
                value, width, signal
            ),
            Self::DivisorOutOfRange { divisor, max } => write!(
                f,
                "ERROR: Divisor {} is outside the legal range [0, {}]",
                divisor, max
            ),
            Self::InvalidClockPeriod(period) => {
                write!(f, "ERROR: Invalid clock period of {} ps", period)
            }
            Self::InvalidSettleEdges => {
                write!(f, "ERROR: At least one settle edge is needed to open a measurement")
            }
            Self::WaitTimeout {
                signal: Some(signal),
                edge: Some(edge),
                waited,
            } => write!(
                f,
                "ERROR: No {:?} edge on {} after waiting {} ps",
                edge, signal, waited
            ),
            Self::WaitTimeout { waited, .. } => {
                write!(f, "ERROR: Wait timed out after {} ps", waited)
            }
            Self::SimulationStalled(now) => {
                write!(f, "ERROR: Nothing left to simulate at {} ps", now)
            }
            // the mismatch carries its own human readable message
            Self::OutOfTolerance(mismatch) => write!(f, "{}", mismatch),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
