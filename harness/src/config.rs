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

use crate::check::{Tolerance, ToleranceChecker, DEFAULT_RELATIVE_TOLERANCE};
use crate::sim::DEFAULT_MAX_WAIT;
use crate::time::{ns, to_ns};
use crate::SimTime;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Seed used when the configuration doesn't name one, so runs repeat.
pub const DEFAULT_SEED: u64 = 0x07654321FEDCBA09u64;

/// provides the knobs of a verification run
///
/// constructed programmatically or read from a YAML file; every field is
/// optional in the file and falls back to the defaults below.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// input clock period used for measurements, in ns
    pub clock_period_ns: f64,
    /// relative tolerance on measured periods
    pub tolerance: f64,
    pub random_iterations: usize,
    pub seed: u64,
    /// rising output edges awaited after programming a divisor; the last
    /// one opens the measured cycle
    pub settle_edges: usize,
    pub trailing_cycle: bool,
    /// longest single wait before the run is declared hung, in ns
    pub max_wait_ns: f64,
    /// how long the smoke test lets the divider run, in ns
    pub smoke_duration_ns: f64,
    pub vcd: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: 1.0,
            tolerance: DEFAULT_RELATIVE_TOLERANCE,
            random_iterations: 10,
            seed: DEFAULT_SEED,
            settle_edges: 2,
            trailing_cycle: true,
            max_wait_ns: to_ns(DEFAULT_MAX_WAIT),
            smoke_duration_ns: 10.0,
            vcd: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_file<P: AsRef<Path>>(file_name: P) -> anyhow::Result<Self> {
        let file = File::open(file_name.as_ref())
            .with_context(|| format!("File {} not found", file_name.as_ref().display()))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader)
            .with_context(|| format!("Malformed config {}", file_name.as_ref().display()))
    }

    pub fn from_str(config: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(config)?)
    }

    pub fn clock_period(&self) -> SimTime {
        ns(self.clock_period_ns)
    }

    pub fn max_wait(&self) -> SimTime {
        ns(self.max_wait_ns)
    }

    pub fn smoke_duration(&self) -> SimTime {
        ns(self.smoke_duration_ns)
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            relative: self.tolerance,
        }
    }

    pub fn checker(&self) -> ToleranceChecker {
        ToleranceChecker::new(self.clock_period(), self.tolerance())
    }
}
