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

use crate::ports::{SignalBus, SignalId};
use crate::SimTime;
use bitvec::prelude::*;
use chrono;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path;
use vcd;

const DEFAULT_VCD_HEADER: &str = "clock divider harness VCD";

/// Dumps every signal change of a simulation.
///
/// I/O failures never abort a simulation: the first one is logged and the
/// writer goes quiet for the rest of the run.
pub struct VcdWriter {
    writer: vcd::Writer<Box<dyn io::Write>>,
    is_error_state: bool,
    id_map: HashMap<SignalId, vcd::IdCode>,
    widths: HashMap<SignalId, usize>,
    timestamp: Option<SimTime>,
}

impl VcdWriter {
    pub fn create<P: AsRef<path::Path>>(dst: P) -> io::Result<Self> {
        let dst_file = fs::File::create(dst.as_ref())?;
        log::debug!("VCD file: {}", dst.as_ref().display());
        Ok(Self::from_writer(Box::new(io::BufWriter::new(dst_file))))
    }

    pub fn from_writer(writer: Box<dyn io::Write>) -> Self {
        Self {
            writer: vcd::Writer::new(writer),
            is_error_state: false,
            id_map: HashMap::new(),
            widths: HashMap::new(),
            timestamp: None,
        }
    }

    fn vcd_error_handler(&mut self, err: io::Error) {
        if !self.is_error_state {
            self.is_error_state = true;
            log::error!("VCD writing failed with error {:?}", err)
        }
    }

    pub fn is_error_state(&self) -> bool {
        self.is_error_state
    }

    /// Declares every signal of `bus` under `scope` and dumps their current
    /// values at `now`.
    pub fn write_header(&mut self, scope: &str, bus: &SignalBus, now: SimTime) {
        if self.is_error_state {
            return;
        }
        self._write_header(scope, bus, now)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _write_header(&mut self, scope: &str, bus: &SignalBus, now: SimTime) -> io::Result<()> {
        self.writer.comment(DEFAULT_VCD_HEADER)?;
        self.writer.date(chrono::Utc::now().to_string().as_str())?;
        self.writer.timescale(1, vcd::TimescaleUnit::PS)?;
        self.writer.add_module(scope)?;
        for (id, signal) in bus.iter() {
            let var_id =
                self.writer
                    .add_var(vcd::VarType::Wire, signal.width() as u32, signal.name(), None)?;
            self.id_map.insert(id, var_id);
            self.widths.insert(id, signal.width());
        }
        self.writer.upscope()?;
        self.writer.enddefinitions()?;
        for (id, signal) in bus.iter() {
            self._record_change(now, id, signal.value())?;
        }
        Ok(())
    }

    pub fn record_change(&mut self, now: SimTime, id: SignalId, value: u64) {
        if self.is_error_state {
            return;
        }
        if cfg!(feature = "trace-echo-vcd-signal-changes") {
            log::trace!("VCD changing {:?} to {} @{}", id, value, now);
        }
        self._record_change(now, id, value)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _record_change(&mut self, now: SimTime, id: SignalId, value: u64) -> io::Result<()> {
        let id_code = match self.id_map.get(&id) {
            Some(id_code) => *id_code,
            None => {
                log::warn!("Signal {:?} was not declared for VCD dumps.", id);
                return Ok(());
            }
        };
        if self.timestamp != Some(now) {
            self.writer.timestamp(now)?;
            self.timestamp = Some(now);
        }
        let width = self.widths.get(&id).copied().unwrap_or(1);
        if width == 1 {
            self.writer.change_scalar(id_code, value & 1 == 1)
        } else {
            let bits = value.view_bits::<Lsb0>();
            self.writer.change_vector(
                id_code,
                bits[..width.min(64)]
                    .iter()
                    .rev()
                    .map(|b| (*b).into())
                    .collect::<Vec<_>>()
                    .as_slice(),
            )
        }
    }
}
