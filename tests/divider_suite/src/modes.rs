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

use std::str::FromStr;
use structopt::StructOpt;

// Default brings the divider up without checking anything; the others are
// the divisor strategies of the harness.
#[derive(StructOpt, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    Default,
    Single,
    Random,
    Boundary,
    Exhaustive,
}

impl FromStr for StrategyMode {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Default" => Ok(StrategyMode::Default),
            "Single" => Ok(StrategyMode::Single),
            "Random" => Ok(StrategyMode::Random),
            "Boundary" => Ok(StrategyMode::Boundary),
            "Exhaustive" => Ok(StrategyMode::Exhaustive),
            _ => Err(Self::Err::new(
                std::io::ErrorKind::Other,
                format!("Invalid strategy: {}", s),
            )),
        }
    }
}

// Defect injected into the behavioral divider, to see the checks fire.
#[derive(StructOpt, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    None,
    OffByOne,
    SkewedDuty,
    Stuck,
}

impl FromStr for FaultMode {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(FaultMode::None),
            "OffByOne" => Ok(FaultMode::OffByOne),
            "SkewedDuty" => Ok(FaultMode::SkewedDuty),
            "Stuck" => Ok(FaultMode::Stuck),
            _ => Err(Self::Err::new(
                std::io::ErrorKind::Other,
                format!("Invalid fault: {}", s),
            )),
        }
    }
}
