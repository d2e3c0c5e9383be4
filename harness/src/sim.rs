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

//! Discrete-event simulation kernel.
//!
//! Time only moves when a scheduled event is processed. Tests block on
//! `wait_edge` / `wait_for`, which run the event loop until the awaited
//! condition holds; there is no free-running sampling of signals.

use crate::error::{Error, Result};
use crate::ports::{Direction, Edge, PortDecl, SignalBus, SignalId, Transition};
use crate::time;
use crate::vcd::VcdWriter;
use crate::SimTime;

use log::trace;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

/// Default watchdog for a single wait: 1 ms of simulated time.
pub const DEFAULT_MAX_WAIT: SimTime = 1_000_000 * time::PS_PER_NS;

/// A black box plugged into the kernel through named signals.
///
/// The kernel creates one signal per declared port. Whenever an input
/// changes, `evaluate` is called in the same instant and may update outputs
/// through the provided `DeviceIo`.
pub trait Device {
    fn name(&self) -> &str;

    fn ports(&self) -> Vec<PortDecl>;

    /// Elaboration-time constants, e.g. bus widths.
    fn parameters(&self) -> Vec<(&'static str, u64)>;

    /// Called once after the signal bus is built, so the device can resolve
    /// the ids of its ports.
    fn elaborate(&mut self, bus: &SignalBus) -> Result<()>;

    fn evaluate(&mut self, io: &mut DeviceIo<'_>, changed: Transition);
}

/// The device's view of the signal bus during `evaluate`.
pub struct DeviceIo<'a> {
    bus: &'a mut SignalBus,
    transitions: &'a mut Vec<Transition>,
    now: SimTime,
}

impl<'a> DeviceIo<'a> {
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn get(&self, id: SignalId) -> u64 {
        self.bus.value(id)
    }

    /// Drives an output. Values wider than the output are truncated.
    pub fn set(&mut self, id: SignalId, value: u64) {
        if self.bus.get(id).direction() != Direction::Output {
            log::warn!(
                "Device tried to drive input {}; ignored",
                self.bus.get(id).name()
            );
            return;
        }
        if let Some(transition) = self.bus.store(id, value) {
            self.transitions.push(transition);
        }
    }
}

#[derive(Default)]
pub struct SimulationCallbacks {
    vcd_writer: Option<Rc<RefCell<VcdWriter>>>,
}

impl SimulationCallbacks {
    pub fn get_vcd_writer(&self) -> Option<Rc<RefCell<VcdWriter>>> {
        self.vcd_writer.as_ref().map(Rc::clone)
    }

    pub fn with_vcd_writer(writer: VcdWriter) -> Self {
        Self {
            vcd_writer: Some(Rc::new(RefCell::new(writer))),
        }
    }

    pub fn vcd<F>(&self, f: F)
    where
        F: FnOnce(Rc<RefCell<VcdWriter>>),
    {
        if let Some(writer) = self.get_vcd_writer() {
            f(writer)
        }
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug)]
enum EventKind {
    ClockToggle { signal: SignalId, token: u64 },
    Wake(u64),
}

/// Ordered by time first; events of the same instant run in scheduling order.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug)]
struct ScheduledEvent {
    time: SimTime,
    seq: u64,
    kind: EventKind,
}

#[derive(Clone, Copy, Debug)]
struct ClockGenerator {
    token: u64,
    high: SimTime,
    low: SimTime,
}

pub struct Simulator {
    device: Box<dyn Device>,
    bus: SignalBus,
    parameters: HashMap<&'static str, u64>,
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<Reverse<ScheduledEvent>>,

    /// At most one generator per signal; toggles carrying a stale token are
    /// dropped when they come due.
    clocks: HashMap<SignalId, ClockGenerator>,
    next_token: u64,

    /// Changes applied while processing the current event.
    transitions: Vec<Transition>,
    max_wait: SimTime,
    callbacks: SimulationCallbacks,
}

impl Simulator {
    pub fn new(mut device: Box<dyn Device>) -> Result<Self> {
        let bus = SignalBus::from_ports(&device.ports());
        device.elaborate(&bus)?;
        let parameters = device.parameters().into_iter().collect();
        log::debug!(
            "Elaborated device {} with {} signals",
            device.name(),
            bus.len()
        );
        Ok(Self {
            device,
            bus,
            parameters,
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            clocks: HashMap::new(),
            next_token: 0,
            transitions: vec![],
            max_wait: DEFAULT_MAX_WAIT,
            callbacks: SimulationCallbacks::default(),
        })
    }

    /// Installs callbacks; a VCD writer gets its header right away.
    pub fn set_callbacks(&mut self, callbacks: SimulationCallbacks) {
        let (name, bus, now) = (self.device.name(), &self.bus, self.now);
        callbacks.vcd(|writer| writer.borrow_mut().write_header(name, bus, now));
        self.callbacks = callbacks;
    }

    pub fn set_max_wait(&mut self, max_wait: SimTime) {
        self.max_wait = max_wait;
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn signal(&self, name: &str) -> Result<SignalId> {
        self.bus.lookup(name)
    }

    pub fn parameter(&self, name: &str) -> Result<u64> {
        self.parameters
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    pub fn read(&self, id: SignalId) -> u64 {
        self.bus.value(id)
    }

    fn check_input(&self, id: SignalId) -> Result<()> {
        let signal = self.bus.get(id);
        if signal.direction() != Direction::Input {
            return Err(Error::NotAnInput(signal.name().to_string()));
        }
        Ok(())
    }

    /// Writes an input at the current instant.
    pub fn drive(&mut self, id: SignalId, value: u64) -> Result<()> {
        self.check_input(id)?;
        let signal = self.bus.get(id);
        if value & !signal.mask() != 0 {
            return Err(Error::ValueOutOfRange {
                signal: signal.name().to_string(),
                value,
                width: signal.width(),
            });
        }
        self.apply_write(id, value);
        self.transitions.clear();
        Ok(())
    }

    /// Starts a free-running clock on `id`, replacing any clock already
    /// driving it. The first phase is driven immediately.
    pub fn start_clock(&mut self, id: SignalId, period: SimTime, start_high: bool) -> Result<()> {
        self.check_input(id)?;
        let high = period / 2;
        let low = period - high;
        if high == 0 {
            return Err(Error::InvalidClockPeriod(period));
        }
        let token = self.next_token;
        self.next_token += 1;
        if self
            .clocks
            .insert(id, ClockGenerator { token, high, low })
            .is_some()
        {
            log::debug!(
                "Restarting clock on {} @{}",
                self.bus.get(id).name(),
                self.now
            );
        }
        self.apply_write(id, start_high as u64);
        self.transitions.clear();
        let first_phase = if start_high { high } else { low };
        self.schedule(self.now + first_phase, EventKind::ClockToggle { signal: id, token });
        Ok(())
    }

    pub fn stop_clock(&mut self, id: SignalId) {
        self.clocks.remove(&id);
    }

    /// Blocks until the next `edge` on `id` and returns its instant.
    pub fn wait_edge(&mut self, id: SignalId, edge: Edge) -> Result<SimTime> {
        let start = self.now;
        let deadline = start.saturating_add(self.max_wait);
        loop {
            match self.queue.peek() {
                None => return Err(Error::SimulationStalled(self.now)),
                Some(Reverse(event)) if event.time > deadline => {
                    return Err(Error::WaitTimeout {
                        signal: Some(self.bus.get(id).name().to_string()),
                        edge: Some(edge),
                        waited: self.max_wait,
                    })
                }
                Some(_) => {}
            }
            self.transitions.clear();
            self.step()?;
            let hit = self
                .transitions
                .iter()
                .any(|t| t.signal == id && edge.matches(t.old, t.new));
            self.transitions.clear();
            if hit {
                return Ok(self.now);
            }
        }
    }

    /// Blocks for `duration` of simulated time.
    pub fn wait_for(&mut self, duration: SimTime) -> Result<()> {
        let wake = self.next_seq;
        self.schedule(self.now + duration, EventKind::Wake(wake));
        loop {
            self.transitions.clear();
            let kind = self.step()?;
            self.transitions.clear();
            if kind == EventKind::Wake(wake) {
                return Ok(());
            }
        }
    }

    fn schedule(&mut self, time: SimTime, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledEvent { time, seq, kind }));
    }

    fn step(&mut self) -> Result<EventKind> {
        let Reverse(event) = self
            .queue
            .pop()
            .ok_or(Error::SimulationStalled(self.now))?;
        debug_assert!(event.time >= self.now);
        self.now = event.time;
        if cfg!(feature = "trace-kernel-events") {
            trace!("@{} processing {:?}", self.now, event.kind);
        }
        if let EventKind::ClockToggle { signal, token } = event.kind {
            let generator = match self.clocks.get(&signal) {
                Some(generator) if generator.token == token => *generator,
                // stopped or restarted since this toggle was scheduled
                _ => return Ok(event.kind),
            };
            let value = !self.bus.value(signal) & 1;
            self.apply_write(signal, value);
            let phase = if value == 1 {
                generator.high
            } else {
                generator.low
            };
            self.schedule(self.now + phase, event.kind);
        }
        Ok(event.kind)
    }

    fn apply_write(&mut self, id: SignalId, value: u64) {
        let start = self.transitions.len();
        if let Some(transition) = self.bus.store(id, value) {
            self.transitions.push(transition);
            let mut io = DeviceIo {
                bus: &mut self.bus,
                transitions: &mut self.transitions,
                now: self.now,
            };
            self.device.evaluate(&mut io, transition);
        }
        let now = self.now;
        let changes = &self.transitions[start..];
        self.callbacks.vcd(|writer| {
            let mut writer = writer.borrow_mut();
            for change in changes {
                writer.record_change(now, change.signal, change.new);
            }
        });
    }
}
