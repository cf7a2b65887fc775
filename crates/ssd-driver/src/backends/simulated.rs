//! Simulated accelerator backend
//!
//! An in-memory model of the accelerator front end, implementing
//! [`RegisterBus`] so the handshake can run without the FPGA. It reacts to
//! control-word edges the same way the fabric does:
//!
//! ```text
//! START  ↑          select the template ID on the bus, clear DONE
//! START  ↓          begin a run, expect sample index 1
//! READY  ↑ @ i      latch DATA_IN as sample i (must be the next index)
//! after L samples   compute SSD against ROM[id] in a 32-bit accumulator
//! STATUS reads      busy for `busy_polls` reads, then DONE
//! ```
//!
//! Every access is kept in a trace and every departure from the protocol is
//! recorded as a [`ProtocolViolation`], so tests can assert on the exact
//! transaction order the driver produced.

use crate::backend::{BackendType, RegisterBus};
use crate::error::Result;
use crate::reference::compute_distance_wrapping;
use crate::template::{TemplateId, TemplateTable};
use ssd_chip::{ControlWord, FieldLayout, Register};
use tracing::{debug, warn};

/// Status reads that return busy before DONE, by default.
pub const DEFAULT_BUSY_POLLS: u32 = 2;

/// When the model asserts DONE once all samples are latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Busy for this many status reads, then DONE
    AfterPolls(u32),
    /// Never assert DONE (wedged accelerator)
    Never,
}

/// One register access observed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Driver wrote `value` to `reg`
    Write {
        /// Port written
        reg: Register,
        /// Value written
        value: u32,
    },
    /// Driver read `value` from `reg`
    Read {
        /// Port read
        reg: Register,
        /// Value returned
        value: u32,
    },
}

/// A departure from the handshake protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolViolation {
    /// Position in the trace of the offending access
    pub event: usize,
    /// What went wrong
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Armed { template: u8 },
    Streaming { template: u8, latched: Vec<i16> },
    Computing { busy_polls_left: Option<u32> },
    Done,
}

/// In-memory model of the SSD accelerator.
#[derive(Debug)]
pub struct SimulatedAccelerator {
    rom: TemplateTable,
    layout: FieldLayout,
    completion: Completion,
    control: ControlWord,
    data_in: u32,
    data_fresh: bool,
    result: u32,
    phase: Phase,
    trace: Vec<BusEvent>,
    violations: Vec<ProtocolViolation>,
    runs_completed: u64,
}

impl SimulatedAccelerator {
    /// Model an accelerator whose ROM holds `rom`.
    pub fn new(rom: TemplateTable, layout: FieldLayout) -> Self {
        debug!(
            "SimulatedAccelerator: ROM {} templates × {} samples",
            rom.len(),
            rom.sample_len()
        );
        Self {
            rom,
            layout,
            completion: Completion::AfterPolls(DEFAULT_BUSY_POLLS),
            control: ControlWord::default(),
            data_in: 0,
            data_fresh: false,
            result: 0,
            phase: Phase::Idle,
            trace: Vec::new(),
            violations: Vec::new(),
            runs_completed: 0,
        }
    }

    /// Model of the reference accelerator.
    pub fn reference() -> Self {
        Self::new(TemplateTable::reference(), FieldLayout::REFERENCE)
    }

    /// Set when DONE is asserted.
    #[must_use]
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Every access observed so far, in order.
    pub fn trace(&self) -> &[BusEvent] {
        &self.trace
    }

    /// Writes only, in order.
    pub fn writes(&self) -> impl Iterator<Item = (Register, u32)> + '_ {
        self.trace.iter().filter_map(|e| match *e {
            BusEvent::Write { reg, value } => Some((reg, value)),
            BusEvent::Read { .. } => None,
        })
    }

    /// Protocol violations observed so far.
    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    /// Runs that reached DONE.
    pub const fn runs_completed(&self) -> u64 {
        self.runs_completed
    }

    fn violation(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("SimulatedAccelerator: protocol violation: {reason}");
        self.violations.push(ProtocolViolation {
            event: self.trace.len().saturating_sub(1),
            reason,
        });
    }

    fn on_control(&mut self, raw: u32) {
        let prev = self.control;
        let word = self.layout.decode(raw);
        self.control = word;

        if !prev.start && word.start {
            self.phase = Phase::Armed {
                template: word.template_id,
            };
            return;
        }

        if prev.start && !word.start {
            self.release_start(word);
            return;
        }

        if prev.data_ready && word.data_ready && prev.index != word.index {
            self.violation(format!(
                "index changed {} → {} while DATA_READY held high",
                prev.index, word.index
            ));
        }

        if !prev.data_ready && word.data_ready {
            self.latch_sample(word);
        }
    }

    fn release_start(&mut self, word: ControlWord) {
        let Phase::Armed { template } = self.phase else {
            self.violation("START released without being raised");
            return;
        };
        if template != word.template_id {
            self.violation(format!(
                "template ID changed {template} → {} across the START pulse",
                word.template_id
            ));
        }
        if self.rom.get(TemplateId::new(word.template_id)).is_err() {
            self.violation(format!("template ID {} not in ROM", word.template_id));
            self.phase = Phase::Idle;
            return;
        }
        self.phase = Phase::Streaming {
            template: word.template_id,
            latched: Vec::with_capacity(self.rom.sample_len()),
        };
    }

    fn latch_sample(&mut self, word: ControlWord) {
        let data_fresh = std::mem::replace(&mut self.data_fresh, false);
        let (template, expected) = match &self.phase {
            Phase::Streaming { template, latched } => (*template, latched.len() + 1),
            _ => {
                self.violation(format!("DATA_READY raised at index {} outside a run", word.index));
                return;
            }
        };

        if usize::from(word.index) != expected {
            let got = word.index;
            self.violation(format!("DATA_READY at index {got}, expected {expected}"));
            return;
        }
        if word.template_id != template {
            let got = word.template_id;
            self.violation(format!("template ID changed {template} → {got} mid-stream"));
        }
        if !data_fresh {
            self.violation(format!("DATA_READY at index {expected} without a DATA_IN write"));
        }

        // Port keeps the low 16 bits of the sign-extended sample.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let sample = self.data_in as u16 as i16;

        let sample_len = self.rom.sample_len();
        let complete = match &mut self.phase {
            Phase::Streaming { latched, .. } => {
                latched.push(sample);
                (latched.len() == sample_len).then(|| std::mem::take(latched))
            }
            _ => None,
        };
        if let Some(samples) = complete {
            self.finish_stream(template, &samples);
        }
    }

    fn finish_stream(&mut self, template: u8, samples: &[i16]) {
        let distance = self
            .rom
            .get(TemplateId::new(template))
            .and_then(|t| compute_distance_wrapping(samples, t.samples()));
        match distance {
            Ok(d) => {
                self.result = d.get();
                self.phase = Phase::Computing {
                    busy_polls_left: match self.completion {
                        Completion::AfterPolls(n) => Some(n),
                        Completion::Never => None,
                    },
                };
            }
            Err(e) => {
                self.violation(format!("cannot compare against template {template}: {e}"));
                self.phase = Phase::Idle;
            }
        }
    }

    fn status(&mut self) -> u32 {
        match &mut self.phase {
            Phase::Computing {
                busy_polls_left: Some(0),
            } => {
                self.phase = Phase::Done;
                self.runs_completed += 1;
                self.layout.done
            }
            Phase::Computing {
                busy_polls_left: Some(n),
            } => {
                *n -= 1;
                0
            }
            Phase::Done => self.layout.done,
            _ => 0,
        }
    }
}

impl RegisterBus for SimulatedAccelerator {
    fn read32(&mut self, reg: Register) -> Result<u32> {
        let value = match reg {
            Register::Control => self.layout.encode(self.control),
            Register::DataIn => self.data_in,
            Register::Status => self.status(),
            Register::ResultOut => self.result,
        };
        self.trace.push(BusEvent::Read { reg, value });
        if reg == Register::ResultOut && self.phase != Phase::Done {
            self.violation("RESULT_OUT read before DONE");
        }
        Ok(value)
    }

    fn write32(&mut self, reg: Register, value: u32) -> Result<()> {
        self.trace.push(BusEvent::Write { reg, value });
        if !reg.is_writable() {
            self.violation(format!("write of {value:#x} to read-only {reg}"));
            return Ok(());
        }
        if reg == Register::Control {
            self.on_control(value);
        } else {
            self.data_in = value;
            self.data_fresh = true;
        }
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Simulated
    }
}
