//! Control-word encoding.
//!
//! Every control write carries the template ID, so the ID is latched before
//! START rises and stays stable for the whole run. The sample index is
//! 1-based: index 0 means "no sample selected", which is what the word looks
//! like during the START pulse.

use crate::regs::{control, status};

/// Bit layout of the control and status registers.
///
/// [`FieldLayout::REFERENCE`] matches the synthesized accelerator. Other
/// layouts exist only so drivers and models can be exercised against
/// re-synthesized variants without recompiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// START pulse mask.
    pub start: u32,
    /// DATA_READY pulse mask.
    pub data_ready: u32,
    /// Bit position of the sample index field.
    pub index_shift: u32,
    /// Width of the sample index field.
    pub index_width: u32,
    /// Bit position of the template ID field.
    pub id_shift: u32,
    /// Width of the template ID field.
    pub id_width: u32,
    /// DONE mask in the status register.
    pub done: u32,
}

impl FieldLayout {
    /// Layout of the reference accelerator.
    pub const REFERENCE: Self = Self {
        start: control::START,
        data_ready: control::DATA_READY,
        index_shift: control::INDEX_SHIFT,
        index_width: control::INDEX_WIDTH,
        id_shift: control::ID_SHIFT,
        id_width: control::ID_WIDTH,
        done: status::DONE,
    };

    /// Number of distinct template IDs the ID field can carry.
    #[must_use]
    pub const fn template_id_capacity(&self) -> usize {
        1 << self.id_width
    }

    /// Longest vector the index field can address.
    ///
    /// Index 0 is reserved, so a 2-bit field addresses samples 1..=3.
    #[must_use]
    pub const fn max_samples(&self) -> usize {
        (1 << self.index_width) - 1
    }

    const fn index_mask(&self) -> u32 {
        ((1 << self.index_width) - 1) << self.index_shift
    }

    const fn id_mask(&self) -> u32 {
        ((1 << self.id_width) - 1) << self.id_shift
    }

    /// Encode a control word into its register value.
    #[must_use]
    pub fn encode(&self, word: ControlWord) -> u32 {
        debug_assert!(usize::from(word.template_id) < self.template_id_capacity());
        debug_assert!(usize::from(word.index) <= self.max_samples());

        let mut raw = (u32::from(word.template_id) << self.id_shift) & self.id_mask();
        raw |= (u32::from(word.index) << self.index_shift) & self.index_mask();
        if word.start {
            raw |= self.start;
        }
        if word.data_ready {
            raw |= self.data_ready;
        }
        raw
    }

    /// Decode a register value back into its fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // fields are at most 8 bits wide
    pub fn decode(&self, raw: u32) -> ControlWord {
        ControlWord {
            template_id: ((raw & self.id_mask()) >> self.id_shift) as u8,
            index: ((raw & self.index_mask()) >> self.index_shift) as u8,
            start: raw & self.start != 0,
            data_ready: raw & self.data_ready != 0,
        }
    }

    /// Whether a status value has DONE asserted.
    #[must_use]
    pub const fn is_done(&self, status: u32) -> bool {
        status & self.done != 0
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Decoded contents of the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlWord {
    /// Template selected in the ROM.
    pub template_id: u8,
    /// 1-based sample index, 0 when no sample is addressed.
    pub index: u8,
    /// START pulse level.
    pub start: bool,
    /// DATA_READY pulse level.
    pub data_ready: bool,
}

impl ControlWord {
    /// Word selecting `template_id` with every pulse low.
    #[must_use]
    pub const fn select(template_id: u8) -> Self {
        Self {
            template_id,
            index: 0,
            start: false,
            data_ready: false,
        }
    }

    /// Same word with START high.
    #[must_use]
    pub const fn with_start(mut self) -> Self {
        self.start = true;
        self
    }

    /// Same word addressing 1-based sample `index`.
    #[must_use]
    pub const fn with_index(mut self, index: u8) -> Self {
        self.index = index;
        self
    }

    /// Same word with DATA_READY high.
    #[must_use]
    pub const fn with_data_ready(mut self) -> Self {
        self.data_ready = true;
        self
    }
}
