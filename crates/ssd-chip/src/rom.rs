//! Template ROM contents of the reference accelerator.
//!
//! The fabric stores ten three-sample templates, addressed by ID. The driver
//! keeps this mirror so the software path can be checked against the same
//! ground truth the hardware compares with.

/// Samples per template (and per captured vector).
pub const SAMPLES: usize = 3;

/// Templates stored in the ROM.
pub const TEMPLATE_COUNT: usize = 10;

/// Template labels, indexed by ID.
#[rustfmt::skip]
pub const LABELS: [&str; TEMPLATE_COUNT] = [
    "MODELO_Z", "MODELO_H", "MODELO_J", "MODELO_P", "MODELO_X",
    "MODELO_Q", "MODELO_G", "MODELO_V", "MODELO_R", "MODELO_T",
];

/// Template samples, indexed by ID.
pub const SAMPLES_BY_ID: [[i16; SAMPLES]; TEMPLATE_COUNT] = [
    [1, 2, 3],       // 0 Z
    [100, 100, 100], // 1 H
    [5, 15, 25],     // 2 J
    [10, 30, 50],    // 3 P
    [1, 10, 50],     // 4 X
    [50, 10, 1],     // 5 Q
    [10, 20, 30],    // 6 G
    [10, 40, 70],    // 7 V
    [5, 25, 55],     // 8 R
    [2, 22, 42],     // 9 T
];

/// Vector used to characterise the accelerator on the bench.
pub const CAPTURED: [i16; SAMPLES] = [2, 20, 10];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_unique() {
        for (i, a) in LABELS.iter().enumerate() {
            assert!(!LABELS[i + 1..].contains(a), "duplicate label {a}");
        }
    }

    #[test]
    fn fits_reference_fields() {
        let layout = crate::FieldLayout::REFERENCE;
        assert!(TEMPLATE_COUNT <= layout.template_id_capacity());
        assert!(SAMPLES <= layout.max_samples());
    }
}
