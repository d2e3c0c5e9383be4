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

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Index of a signal in the simulator's signal bus.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy, Debug)]
pub struct SignalId(pub(crate) usize);

/// Seen from the device: inputs are driven by the harness, outputs by the
/// device.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Clone, Debug)]
pub struct PortDecl {
    pub name: &'static str,
    pub direction: Direction,
    pub width: usize,
}

impl PortDecl {
    pub fn input(name: &'static str, width: usize) -> Self {
        Self {
            name,
            direction: Direction::Input,
            width,
        }
    }

    pub fn output(name: &'static str, width: usize) -> Self {
        Self {
            name,
            direction: Direction::Output,
            width,
        }
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum Edge {
    Rising,
    Falling,
    Any,
}

impl Edge {
    /// Edges are defined on bit 0; `Any` matches every value change.
    pub fn matches(&self, old: u64, new: u64) -> bool {
        match self {
            Edge::Rising => old & 1 == 0 && new & 1 == 1,
            Edge::Falling => old & 1 == 1 && new & 1 == 0,
            Edge::Any => old != new,
        }
    }
}

/// A value change recorded by the kernel while processing one event.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub struct Transition {
    pub signal: SignalId,
    pub old: u64,
    pub new: u64,
}

#[derive(Clone, Debug)]
pub struct Signal {
    name: &'static str,
    direction: Direction,
    width: usize,
    value: u64,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn mask(&self) -> u64 {
        mask(self.width)
    }
}

pub fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// All signals of an elaborated device.
#[derive(Clone, Debug, Default)]
pub struct SignalBus {
    signals: Vec<Signal>,
    by_name: HashMap<&'static str, SignalId>,
}

impl SignalBus {
    pub fn from_ports(ports: &[PortDecl]) -> Self {
        let mut bus = Self::default();
        for port in ports {
            if bus.by_name.contains_key(port.name) {
                log::warn!("Port {} declared twice, keeping the first", port.name);
                continue;
            }
            let id = SignalId(bus.signals.len());
            bus.signals.push(Signal {
                name: port.name,
                direction: port.direction,
                width: port.width,
                value: 0,
            });
            bus.by_name.insert(port.name, id);
        }
        bus
    }

    pub fn lookup(&self, name: &str) -> Result<SignalId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSignal(name.to_string()))
    }

    pub fn get(&self, id: SignalId) -> &Signal {
        &self.signals[id.0]
    }

    pub fn value(&self, id: SignalId) -> u64 {
        self.signals[id.0].value
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(index, signal)| (SignalId(index), signal))
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Stores `value` and returns the transition if the value changed.
    /// Values are truncated to the signal width; callers that must reject
    /// wide values check before storing.
    pub(crate) fn store(&mut self, id: SignalId, value: u64) -> Option<Transition> {
        let signal = &mut self.signals[id.0];
        let value = value & mask(signal.width);
        if signal.value == value {
            return None;
        }
        let old = signal.value;
        signal.value = value;
        Some(Transition {
            signal: id,
            old,
            new: value,
        })
    }
}
