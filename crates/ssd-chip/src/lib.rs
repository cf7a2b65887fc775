//! Register model of the SSD template-matching accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**; it is a
//! pure model of the accelerator front end: register offsets, control and
//! status bit layout, control-word encoding, and the contents of the
//! template ROM baked into the fabric.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register block: offsets, `Register` enum, bit definitions |
//! | [`control`] | `FieldLayout` and `ControlWord` encoding (START, DATA_READY, index, template ID) |
//! | [`rom`] | Reference template ROM (10 × 3 samples) and the captured test vector |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod control;
pub mod regs;
pub mod rom;

pub use control::{ControlWord, FieldLayout};
pub use regs::Register;
