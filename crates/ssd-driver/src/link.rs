//! Accelerator handshake
//!
//! One handshake compares the captured vector against one ROM template:
//!
//! ```text
//! CONTROL  ← id | START            arm (ID already latched)
//! CONTROL  ← id                    START low: run begins on the falling edge
//! for i in 1..=L:
//!     DATA_IN ← sample[i-1]
//!     CONTROL ← id | i | READY     sample latched on the rising edge
//!     CONTROL ← id | i             READY low
//! until STATUS & DONE: spin
//! RESULT_OUT → distance
//! ```
//!
//! Every pulse is a separate write and the register block is borrowed
//! mutably for the whole exchange, so nothing can interleave mid-handshake.
//! A failed handshake has no partial state worth keeping: the next call
//! starts again from the START pulse.

use crate::backend::RegisterBus;
use crate::config::ClassifierConfig;
use crate::distance::Distance;
use crate::error::{Result, SsdError};
use crate::template::{FeatureVector, TemplateId, TemplateTable};
use ssd_chip::{ControlWord, FieldLayout, Register};
use tracing::{debug, trace};

/// How to wait for DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionWait {
    /// Spin on STATUS until DONE, however long that takes.
    ///
    /// This is the accelerator's contract: it always completes. A wedged
    /// accelerator hangs the caller.
    #[default]
    Unbounded,

    /// Spin at most `max_polls` status reads, then fail with
    /// [`SsdError::HardwareTimeout`]. Opt-in only.
    Bounded {
        /// Status reads before giving up
        max_polls: u64,
    },
}

/// Driver side of the accelerator handshake.
#[derive(Debug)]
pub struct HardwareLink<B: RegisterBus> {
    bus: B,
    layout: FieldLayout,
    template_count: usize,
    sample_len: usize,
    wait: CompletionWait,
}

impl<B: RegisterBus> HardwareLink<B> {
    /// Create a link for an accelerator whose ROM holds `templates`.
    pub fn new(bus: B, layout: FieldLayout, templates: &TemplateTable) -> Self {
        debug!(
            "HardwareLink on {} backend: {} templates × {} samples",
            bus.backend_type(),
            templates.len(),
            templates.sample_len()
        );
        Self {
            bus,
            layout,
            template_count: templates.len(),
            sample_len: templates.sample_len(),
            wait: CompletionWait::Unbounded,
        }
    }

    /// Create a link using the layout, table, and wait mode in `config`.
    pub fn from_config(bus: B, config: &ClassifierConfig) -> Self {
        Self::new(bus, config.layout(), config.templates()).with_wait(config.accelerator().wait())
    }

    /// Select the completion wait mode.
    #[must_use]
    pub fn with_wait(mut self, wait: CompletionWait) -> Self {
        self.wait = wait;
        self
    }

    /// Current completion wait mode.
    pub const fn wait(&self) -> CompletionWait {
        self.wait
    }

    /// Run one full handshake and return the distance the accelerator reports.
    ///
    /// # Errors
    ///
    /// Returns error before any register access if `template_id` is not in
    /// the ROM or `vector` has the wrong length. Returns
    /// [`SsdError::HardwareTimeout`] only under [`CompletionWait::Bounded`].
    pub fn run_handshake(
        &mut self,
        vector: &FeatureVector,
        template_id: TemplateId,
    ) -> Result<Distance> {
        self.check(vector, template_id)?;
        debug!("Handshake: template {template_id}, {} samples", vector.len());

        let selected = ControlWord::select(template_id.get());

        // Arm: START high then low while the ID is held.
        self.write_control(selected.with_start())?;
        self.write_control(selected)?;

        for (position, &sample) in vector.samples().iter().enumerate() {
            let index = u8::try_from(position + 1).map_err(|_| SsdError::SampleIndexOverflow {
                index: position + 1,
                max: self.layout.max_samples(),
            })?;
            let addressed = selected.with_index(index);

            self.write_data_in(sample)?;
            self.write_control(addressed.with_data_ready())?;
            self.write_control(addressed)?;
        }

        let distance = self.await_completion()?;
        debug!("Handshake: template {template_id} → {distance}");
        Ok(distance)
    }

    /// Block until DONE, then read the result register once.
    ///
    /// # Errors
    ///
    /// Returns error if a register access fails, or on timeout in
    /// bounded mode.
    pub fn await_completion(&mut self) -> Result<Distance> {
        let polls = match self.wait {
            CompletionWait::Unbounded => {
                let mut polls = 0u64;
                loop {
                    polls += 1;
                    let status = self.bus.read32(Register::Status)?;
                    if self.layout.is_done(status) {
                        break polls;
                    }
                    std::hint::spin_loop();
                }
            }
            CompletionWait::Bounded { max_polls } => self.poll_bounded(max_polls)?,
        };

        let raw = self.bus.read32(Register::ResultOut)?;
        trace!("DONE after {polls} polls, RESULT_OUT = {raw:#x}");
        Ok(Distance::new(raw))
    }

    fn poll_bounded(&mut self, max_polls: u64) -> Result<u64> {
        for polls in 1..=max_polls {
            let status = self.bus.read32(Register::Status)?;
            if self.layout.is_done(status) {
                return Ok(polls);
            }
            std::hint::spin_loop();
        }
        Err(SsdError::HardwareTimeout { polls: max_polls })
    }

    fn check(&self, vector: &FeatureVector, template_id: TemplateId) -> Result<()> {
        let addressable = self.template_count.min(self.layout.template_id_capacity());
        if template_id.index() >= addressable {
            return Err(SsdError::InvalidTemplateId {
                id: template_id.index(),
                count: addressable,
            });
        }
        if vector.len() != self.sample_len {
            return Err(SsdError::length_mismatch(self.sample_len, vector.len()));
        }
        if vector.len() > self.layout.max_samples() {
            return Err(SsdError::SampleIndexOverflow {
                index: vector.len(),
                max: self.layout.max_samples(),
            });
        }
        Ok(())
    }

    fn write_control(&mut self, word: ControlWord) -> Result<()> {
        let raw = self.layout.encode(word);
        trace!("CONTROL ← {raw:#04x}");
        self.bus.write32(Register::Control, raw)
    }

    fn write_data_in(&mut self, sample: i16) -> Result<()> {
        // Port takes the sample sign-extended to the full word.
        #[allow(clippy::cast_sign_loss)]
        let raw = i32::from(sample) as u32;
        trace!("DATA_IN ← {raw:#010x} ({sample})");
        self.bus.write32(Register::DataIn, raw)
    }

    /// Borrow the register backend.
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the register backend.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendType;
    use std::collections::VecDeque;

    /// Records writes and replays scripted status/result reads.
    #[derive(Debug, Default)]
    struct ScriptedBus {
        writes: Vec<(Register, u32)>,
        reads: VecDeque<u32>,
        status_reads: u64,
    }

    impl RegisterBus for ScriptedBus {
        fn read32(&mut self, reg: Register) -> Result<u32> {
            if reg == Register::Status {
                self.status_reads += 1;
            }
            Ok(self.reads.pop_front().unwrap_or(0))
        }

        fn write32(&mut self, reg: Register, value: u32) -> Result<()> {
            self.writes.push((reg, value));
            Ok(())
        }

        fn backend_type(&self) -> BackendType {
            BackendType::Simulated
        }
    }

    fn link(reads: &[u32]) -> HardwareLink<ScriptedBus> {
        let bus = ScriptedBus {
            reads: reads.iter().copied().collect(),
            ..ScriptedBus::default()
        };
        HardwareLink::new(bus, FieldLayout::REFERENCE, &TemplateTable::reference())
    }

    #[test]
    fn writes_exact_register_sequence() {
        use Register::{Control, DataIn};

        // two busy polls, then DONE, then result
        let mut link = link(&[0, 0, 1, 374]);
        let vector = FeatureVector::new(vec![2, -20, 10]).unwrap();
        let d = link.run_handshake(&vector, TemplateId::new(3)).unwrap();
        assert_eq!(d, Distance::new(374));
        assert_eq!(
            link.bus().writes,
            vec![
                (Control, 0x31),
                (Control, 0x30),
                (DataIn, 2),
                (Control, 0x36),
                (Control, 0x34),
                (DataIn, 0xFFFF_FFEC),
                (Control, 0x3A),
                (Control, 0x38),
                (DataIn, 10),
                (Control, 0x3E),
                (Control, 0x3C),
            ]
        );
        assert_eq!(link.bus().status_reads, 3);
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut link = link(&[]).with_wait(CompletionWait::Bounded { max_polls: 25 });
        let err = link
            .run_handshake(&FeatureVector::reference(), TemplateId::new(0))
            .unwrap_err();
        assert!(matches!(err, SsdError::HardwareTimeout { polls: 25 }));
        assert_eq!(link.bus().status_reads, 25);
    }

    #[test]
    fn bounded_wait_returns_when_done() {
        let mut link = link(&[0, 1, 81]).with_wait(CompletionWait::Bounded { max_polls: 25 });
        let d = link
            .run_handshake(&FeatureVector::reference(), TemplateId::new(6))
            .unwrap();
        assert_eq!(d.get(), 81);
    }

    #[test]
    fn done_bit_only() {
        // Upper status bits set without DONE must not end the wait.
        let mut link = link(&[0xFFFF_FFFE, 0x1, 7]).with_wait(CompletionWait::Bounded {
            max_polls: 5,
        });
        assert_eq!(link.await_completion().unwrap().get(), 7);
        assert_eq!(link.bus().status_reads, 2);
    }

    #[test]
    fn out_of_range_id_touches_nothing() {
        let mut link = link(&[1, 0]);
        let err = link
            .run_handshake(&FeatureVector::reference(), TemplateId::new(10))
            .unwrap_err();
        assert!(matches!(err, SsdError::InvalidTemplateId { id: 10, count: 10 }));
        assert!(link.bus().writes.is_empty());
    }

    #[test]
    fn wrong_length_touches_nothing() {
        let mut link = link(&[1, 0]);
        let vector = FeatureVector::new(vec![1, 2]).unwrap();
        let err = link.run_handshake(&vector, TemplateId::new(0)).unwrap_err();
        assert!(matches!(err, SsdError::LengthMismatch { expected: 3, actual: 2 }));
        assert!(link.bus().writes.is_empty());
    }
}
