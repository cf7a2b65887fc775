//! Driver for the SSD template-matching accelerator.
//!
//! The accelerator compares a captured vector against templates stored in
//! its ROM and reports the sum of squared differences. This crate drives the
//! register handshake, provides the software SSD used as the golden
//! reference, and reduces per-template distances to a classification.
//!
//! # Backends
//!
//! ```text
//! MmioBus              PIO ports mapped through /dev/mem or UIO (real FPGA)
//! SimulatedAccelerator in-memory model of the fabric, traces every access
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use ssd_driver::{hardware_pass, software_pass, compare, select_backend};
//! use ssd_driver::{BackendSelection, ClassifierConfig, HardwareLink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClassifierConfig::reference();
//! let bus = select_backend(BackendSelection::Auto, &config)?;
//! let mut link = HardwareLink::from_config(bus, &config);
//!
//! let hw = hardware_pass(&mut link, config.vector(), config.templates(), |r| {
//!     println!("{} [ID {}]: {}", r.label, r.template_id, r.distance);
//! })?;
//! let sw = software_pass(config.vector(), config.templates(), |_| {})?;
//!
//! println!("{} ({}), agree: {}", hw.label(), hw.distance(), compare(&hw, &sw).is_match());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
mod classify;
pub mod config;
mod distance;
mod error;
mod link;
mod pass;
pub mod reference;
mod template;

pub use backend::{select_backend, BackendSelection, BackendType, RegisterBus};
pub use backends::{Completion, MmioBus, SimulatedAccelerator};
pub use classify::{BestMatch, Classification, DistanceReport, NO_MATCH};
pub use config::{AcceleratorConfig, ClassifierConfig};
pub use distance::Distance;
pub use error::{Result, SsdError};
pub use link::{CompletionWait, HardwareLink};
pub use pass::{compare, hardware_pass, software_pass, Agreement};
pub use reference::{compute_distance, compute_distance_wrapping};
pub use template::{FeatureVector, Template, TemplateId, TemplateTable};

/// Register model re-exported from ssd-chip.
pub use ssd_chip as chip;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        compare, compute_distance, hardware_pass, software_pass, BackendSelection,
        Classification, ClassifierConfig, CompletionWait, Distance, FeatureVector, HardwareLink,
        RegisterBus, Result, SimulatedAccelerator, SsdError, TemplateId, TemplateTable,
    };
}
