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

//! Simulated time.
//!
//! The kernel counts time in integer picoseconds. Everything facing the
//! harness user (configuration, measurements, messages) is in nanoseconds.

use crate::SimTime;

pub const PS_PER_NS: SimTime = 1_000;

/// Nanoseconds to kernel ticks, rounded to the nearest picosecond. Negative
/// durations clamp to zero.
pub fn ns(value: f64) -> SimTime {
    if value <= 0.0 {
        return 0;
    }
    (value * PS_PER_NS as f64).round() as SimTime
}

pub fn to_ns(ticks: SimTime) -> f64 {
    ticks as f64 / PS_PER_NS as f64
}
