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

//! Expected divider timing and the tolerance it is checked against.

use std::fmt;

use crate::measure::PeriodMeasurement;
use crate::time::to_ns;
use crate::SimTime;

pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 0.01;

/// Output period predicted for a divisor.
///
/// 0 bypasses the divider and 1 inverts the input clock; both keep the
/// input period. Any larger divisor multiplies it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpectedPeriod {
    pub full: f64,
    pub half: f64,
}

impl ExpectedPeriod {
    pub fn for_divisor(divisor: u64, clock_period_ns: f64) -> Self {
        let input_cycles = if divisor < 2 { 1.0 } else { divisor as f64 };
        let full = input_cycles * clock_period_ns;
        Self {
            full,
            half: full / 2.0,
        }
    }
}

/// Relative band around an expected value. Both bounds are exclusive: a
/// measurement landing exactly on one fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: DEFAULT_RELATIVE_TOLERANCE,
        }
    }
}

impl Tolerance {
    pub fn bounds(&self, expected: f64) -> (f64, f64) {
        (
            (1.0 - self.relative) * expected,
            (1.0 + self.relative) * expected,
        )
    }

    pub fn within(&self, measured: f64, expected: f64) -> bool {
        let (lower, upper) = self.bounds(expected);
        measured > lower && measured < upper
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    FullPeriod,
    HalfPeriod,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quantity::FullPeriod => write!(f, "full period"),
            Quantity::HalfPeriod => write!(f, "half period"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub divisor: u64,
    pub quantity: Quantity,
    pub expected: f64,
    pub measured: f64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Incorrect {} for divisor {}. Expected {} ns but measured {} ns",
            self.quantity, self.divisor, self.expected, self.measured
        )
    }
}

/// Compares measurements against the divider's transfer function for a
/// given input clock.
#[derive(Clone, Copy, Debug)]
pub struct ToleranceChecker {
    clock_period_ns: f64,
    tolerance: Tolerance,
}

impl ToleranceChecker {
    pub fn new(clock_period: SimTime, tolerance: Tolerance) -> Self {
        Self {
            clock_period_ns: to_ns(clock_period),
            tolerance,
        }
    }

    pub fn expected(&self, divisor: u64) -> ExpectedPeriod {
        ExpectedPeriod::for_divisor(divisor, self.clock_period_ns)
    }

    fn compare(
        &self,
        divisor: u64,
        quantity: Quantity,
        expected: f64,
        measured: f64,
    ) -> Result<(), Mismatch> {
        if self.tolerance.within(measured, expected) {
            Ok(())
        } else {
            Err(Mismatch {
                divisor,
                quantity,
                expected,
                measured,
            })
        }
    }

    /// Full period only.
    pub fn check_full_period(
        &self,
        divisor: u64,
        measurement: &PeriodMeasurement,
    ) -> Result<(), Mismatch> {
        let expected = self.expected(divisor);
        self.compare(
            divisor,
            Quantity::FullPeriod,
            expected.full,
            measurement.full_period(),
        )
    }

    /// Full period, then half period.
    pub fn check(&self, divisor: u64, measurement: &PeriodMeasurement) -> Result<(), Mismatch> {
        self.check_full_period(divisor, measurement)?;
        let expected = self.expected(divisor);
        self.compare(
            divisor,
            Quantity::HalfPeriod,
            expected.half,
            measurement.half_period(),
        )
    }
}
