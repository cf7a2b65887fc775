//! Classification passes
//!
//! A pass compares the vector against every template in ID order and
//! reduces the distances to the closest one. The hardware pass runs one
//! handshake per template; the software pass computes the same distances on
//! the CPU. Each distance is handed to a sink as soon as it is known, so the
//! caller can report or time individual comparisons without the pass
//! buffering them.

use crate::backend::RegisterBus;
use crate::classify::{Classification, DistanceReport};
use crate::distance::Distance;
use crate::error::Result;
use crate::link::HardwareLink;
use crate::reference::compute_distance;
use crate::template::{FeatureVector, TemplateId, TemplateTable};
use tracing::{info, warn};

/// Classify `vector` on the accelerator.
///
/// # Errors
///
/// Returns the first handshake error; no further templates are tried.
pub fn hardware_pass<B, F>(
    link: &mut HardwareLink<B>,
    vector: &FeatureVector,
    table: &TemplateTable,
    mut sink: F,
) -> Result<Classification>
where
    B: RegisterBus,
    F: FnMut(&DistanceReport),
{
    table.check_vector(vector)?;
    let mut result = Classification::new();
    for template in table {
        let distance = link.run_handshake(vector, template.id())?;
        let report = DistanceReport {
            template_id: template.id(),
            label: template.label().to_string(),
            distance,
        };
        sink(&report);
        result.observe_report(&report);
    }
    info!(
        "Hardware pass: {} ({}) over {} templates",
        result.label(),
        result.distance(),
        table.len()
    );
    Ok(result)
}

/// Classify `vector` with the software reference.
///
/// # Errors
///
/// Returns error if the vector length does not match the table or a
/// distance overflows 32 bits.
pub fn software_pass<F>(
    vector: &FeatureVector,
    table: &TemplateTable,
    mut sink: F,
) -> Result<Classification>
where
    F: FnMut(&DistanceReport),
{
    table.check_vector(vector)?;
    let mut result = Classification::new();
    for template in table {
        let distance = compute_distance(vector.samples(), template.samples())?;
        let report = DistanceReport {
            template_id: template.id(),
            label: template.label().to_string(),
            distance,
        };
        sink(&report);
        result.observe_report(&report);
    }
    info!(
        "Software pass: {} ({}) over {} templates",
        result.label(),
        result.distance(),
        table.len()
    );
    Ok(result)
}

/// Outcome of checking the hardware result against the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Agreement {
    /// Same template, same distance
    Match,
    /// Paths disagree
    Mismatch {
        /// Hardware winner and distance
        hardware: (Option<TemplateId>, Distance),
        /// Software winner and distance
        software: (Option<TemplateId>, Distance),
    },
}

impl Agreement {
    /// Whether both paths agree.
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Compare a hardware pass against a software pass.
pub fn compare(hardware: &Classification, software: &Classification) -> Agreement {
    let hw = (hardware.best().map(|b| b.template_id), hardware.distance());
    let sw = (software.best().map(|b| b.template_id), software.distance());
    if hw == sw {
        Agreement::Match
    } else {
        warn!(
            "Hardware/software disagree: hw {} ({}) vs sw {} ({})",
            hardware.label(),
            hardware.distance(),
            software.label(),
            software.distance()
        );
        Agreement::Mismatch {
            hardware: hw,
            software: sw,
        }
    }
}
