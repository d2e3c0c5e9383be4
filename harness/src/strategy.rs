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

//! Test strategies over the divisor range.
//!
//! Every case re-runs bring-up, programs one divisor, lets the output settle
//! and measures one cycle. Single, random and boundary cases stop at the
//! first out-of-tolerance measurement; the exhaustive sweep only checks the
//! full period and records failures without stopping, so one bad divisor
//! never hides the rest of the range.

use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::fmt;

use crate::bringup::setup;
use crate::check::{Mismatch, ToleranceChecker};
use crate::config::HarnessConfig;
use crate::dut::DividerDut;
use crate::error::{Error, Result};
use crate::measure::{capture, PeriodMeasurement};
use crate::sim::SimulationCallbacks;
use crate::time::ns;
use crate::vcd::VcdWriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Bring-up only, no checks.
    Default,
    Single(u64),
    Random(usize),
    Boundary,
    Exhaustive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaseReport {
    pub divisor: u64,
    pub measurement: PeriodMeasurement,
}

/// A failure the exhaustive sweep logged and moved past.
#[derive(Clone, Debug, PartialEq)]
pub enum SoftFailure {
    OutOfTolerance(Mismatch),
    Measurement { divisor: u64, error: Error },
}

impl SoftFailure {
    pub fn divisor(&self) -> u64 {
        match self {
            SoftFailure::OutOfTolerance(mismatch) => mismatch.divisor,
            SoftFailure::Measurement { divisor, .. } => *divisor,
        }
    }
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SoftFailure::OutOfTolerance(mismatch) => write!(f, "{}", mismatch),
            SoftFailure::Measurement { divisor, error } => {
                write!(f, "Divisor {} could not be measured: {}", divisor, error)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
    pub failures: Vec<SoftFailure>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn divisors(&self) -> Vec<u64> {
        self.cases.iter().map(|case| case.divisor).collect()
    }

    pub fn summary(&self) -> String {
        if self.passed() {
            format!("{} divisor(s) within tolerance", self.cases.len())
        } else {
            format!(
                "{} of {} divisor(s) failed: {}",
                self.failures.len(),
                self.cases.len() + self.failures.len(),
                self.failures.iter().map(|f| f.divisor()).join(", ")
            )
        }
    }
}

/// Drives one divider under a configuration.
pub struct Harness {
    dut: DividerDut,
    config: HarnessConfig,
    checker: ToleranceChecker,
}

impl Harness {
    pub fn new(mut dut: DividerDut, config: HarnessConfig) -> Self {
        dut.sim_mut().set_max_wait(config.max_wait());
        if let Some(path) = &config.vcd {
            match VcdWriter::create(path) {
                Ok(writer) => dut
                    .sim_mut()
                    .set_callbacks(SimulationCallbacks::with_vcd_writer(writer)),
                Err(err) => log::error!(
                    "Can't create VCD file {}: {:?}; running without waveforms",
                    path.display(),
                    err
                ),
            }
        }
        let checker = config.checker();
        Self {
            dut,
            config,
            checker,
        }
    }

    pub fn dut(&self) -> &DividerDut {
        &self.dut
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Brings the divider up with the divisor at 0 and lets it run.
    pub fn default_case(&mut self) -> Result<()> {
        setup(&mut self.dut, self.config.clock_period())?;
        self.dut
            .sim_mut()
            .wait_for(self.config.smoke_duration())?;
        log::info!("Bring-up completed @{}", self.dut.sim().now());
        Ok(())
    }

    /// Bring-up, program `divisor`, settle and measure one output cycle.
    ///
    /// The watchdog never fires before two expected output periods have
    /// passed, whatever the configured limit.
    pub fn measure_divisor(&mut self, divisor: u64) -> Result<PeriodMeasurement> {
        let expected = ns(2.0 * self.checker.expected(divisor).full);
        self.dut
            .sim_mut()
            .set_max_wait(self.config.max_wait().max(expected));
        setup(&mut self.dut, self.config.clock_period())?;
        self.dut.program_divisor(divisor)?;
        let clk_out = self.dut.clk_out();
        capture(
            self.dut.sim_mut(),
            clk_out,
            self.config.settle_edges,
            self.config.trailing_cycle,
        )
    }

    /// Checks full and half period; any deviation is a hard failure.
    pub fn single_case(&mut self, divisor: u64) -> Result<CaseReport> {
        let measurement = self.measure_divisor(divisor)?;
        self.checker
            .check(divisor, &measurement)
            .map_err(Error::OutOfTolerance)?;
        log::debug!("Divisor {} ok", divisor);
        Ok(CaseReport {
            divisor,
            measurement,
        })
    }

    /// `iterations` single cases with divisors drawn from the configured
    /// seed.
    pub fn random_cases(&mut self, iterations: usize) -> Result<Vec<CaseReport>> {
        let mut rng = Xoshiro256StarStar::seed_from_u64(self.config.seed);
        self.random_cases_with(iterations, &mut rng)
    }

    pub fn random_cases_with<R: Rng>(
        &mut self,
        iterations: usize,
        rng: &mut R,
    ) -> Result<Vec<CaseReport>> {
        let max_divisor = self.dut.max_divisor();
        let mut cases = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            let divisor = rng.gen_range(0..=max_divisor);
            log::info!("Random case {}: divisor {}", iteration, divisor);
            cases.push(self.single_case(divisor)?);
        }
        Ok(cases)
    }

    /// 0, 1 and the largest divisor.
    pub fn boundary_cases(&mut self) -> Result<Vec<CaseReport>> {
        let max_divisor = self.dut.max_divisor();
        [0, 1, max_divisor]
            .iter()
            .map(|divisor| self.single_case(*divisor))
            .collect()
    }

    /// Every divisor in range, full period only, failures collected.
    pub fn exhaustive_sweep(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();
        for divisor in 0..=self.dut.max_divisor() {
            let measurement = match self.measure_divisor(divisor) {
                Ok(measurement) => measurement,
                // stuck output: nothing to check for this divisor
                Err(error @ Error::WaitTimeout { .. }) => {
                    log::error!("Divisor {} could not be measured: {}", divisor, error);
                    report
                        .failures
                        .push(SoftFailure::Measurement { divisor, error });
                    continue;
                }
                Err(error) => return Err(error),
            };
            match self.checker.check_full_period(divisor, &measurement) {
                Ok(()) => report.cases.push(CaseReport {
                    divisor,
                    measurement,
                }),
                Err(mismatch) => {
                    log::error!("{}", mismatch);
                    report.failures.push(SoftFailure::OutOfTolerance(mismatch));
                }
            }
        }
        log::info!("Exhaustive sweep: {}", report.summary());
        Ok(report)
    }

    pub fn run(&mut self, strategy: Strategy) -> Result<RunReport> {
        log::info!("Running {:?} on {}", strategy, self.dut.sim().device_name());
        let cases = match strategy {
            Strategy::Default => {
                self.default_case()?;
                vec![]
            }
            Strategy::Single(divisor) => vec![self.single_case(divisor)?],
            Strategy::Random(iterations) => self.random_cases(iterations)?,
            Strategy::Boundary => self.boundary_cases()?,
            Strategy::Exhaustive => return self.exhaustive_sweep(),
        };
        Ok(RunReport {
            cases,
            failures: vec![],
        })
    }
}
