//! Feature vectors and the template table
//!
//! Both are immutable for the lifetime of a run. The table is the driver's
//! mirror of the accelerator ROM: the position of a template in the table is
//! the ID the hardware is asked to compare against.

use crate::error::{Result, SsdError};
use ssd_chip::{rom, FieldLayout};

/// Template identifier as carried in the control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(u8);

impl TemplateId {
    /// Wrap a raw ID.
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw ID value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// ID as a table index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Captured input to classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector(Vec<i16>);

impl FeatureVector {
    /// Wrap captured samples.
    ///
    /// # Errors
    ///
    /// Returns error if `samples` is empty.
    pub fn new(samples: impl Into<Vec<i16>>) -> Result<Self> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(SsdError::invalid_config("feature vector is empty"));
        }
        Ok(Self(samples))
    }

    /// Vector captured for the reference bench run.
    pub fn reference() -> Self {
        Self(rom::CAPTURED.to_vec())
    }

    /// Samples in streaming order.
    pub fn samples(&self) -> &[i16] {
        &self.0
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; construction rejects empty vectors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One stored reference vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: TemplateId,
    label: String,
    samples: Vec<i16>,
}

impl Template {
    /// ROM address of this template.
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Reference samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}

/// Static table of templates, addressed by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTable {
    templates: Vec<Template>,
    sample_len: usize,
}

impl TemplateTable {
    /// Build a table from `(label, samples)` pairs; IDs follow list order.
    ///
    /// The table must be addressable through `layout`: no more templates
    /// than the ID field holds, and vectors no longer than the index field
    /// can count.
    ///
    /// # Errors
    ///
    /// Returns error if the table is empty, too large for the ID field,
    /// has ragged or over-long templates.
    pub fn new<I, S>(entries: I, layout: &FieldLayout) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<i16>)>,
        S: Into<String>,
    {
        let mut templates = Vec::new();
        for (position, (label, samples)) in entries.into_iter().enumerate() {
            let id = u8::try_from(position)
                .ok()
                .filter(|_| position < layout.template_id_capacity())
                .ok_or_else(|| {
                    SsdError::invalid_config(format!(
                        "template #{position} exceeds the {}-entry ID field",
                        layout.template_id_capacity()
                    ))
                })?;
            templates.push(Template {
                id: TemplateId(id),
                label: label.into(),
                samples,
            });
        }

        let Some(first) = templates.first() else {
            return Err(SsdError::invalid_config("template table is empty"));
        };
        let sample_len = first.samples.len();

        if sample_len == 0 {
            return Err(SsdError::invalid_config("templates have no samples"));
        }
        if sample_len > layout.max_samples() {
            return Err(SsdError::invalid_config(format!(
                "templates have {sample_len} samples, index field addresses at most {}",
                layout.max_samples()
            )));
        }
        if let Some(bad) = templates.iter().find(|t| t.samples.len() != sample_len) {
            return Err(SsdError::invalid_config(format!(
                "template {} ({}) has {} samples, expected {sample_len}",
                bad.id,
                bad.label,
                bad.samples.len()
            )));
        }

        Ok(Self {
            templates,
            sample_len,
        })
    }

    /// Mirror of the reference accelerator ROM.
    pub fn reference() -> Self {
        let templates = rom::LABELS
            .iter()
            .zip(rom::SAMPLES_BY_ID.iter())
            .zip(0u8..)
            .map(|((label, samples), id)| Template {
                id: TemplateId(id),
                label: (*label).to_string(),
                samples: samples.to_vec(),
            })
            .collect();
        Self {
            templates,
            sample_len: rom::SAMPLES,
        }
    }

    /// Look up a template by ID.
    ///
    /// # Errors
    ///
    /// Returns error if `id` is not in the table.
    pub fn get(&self, id: TemplateId) -> Result<&Template> {
        self.templates
            .get(id.index())
            .ok_or(SsdError::InvalidTemplateId {
                id: id.index(),
                count: self.templates.len(),
            })
    }

    /// Templates in ID order.
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false; construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Samples per template.
    pub const fn sample_len(&self) -> usize {
        self.sample_len
    }

    /// Check a vector can be compared against this table.
    ///
    /// # Errors
    ///
    /// Returns error if the vector length differs from the templates'.
    pub fn check_vector(&self, vector: &FeatureVector) -> Result<()> {
        if vector.len() == self.sample_len {
            Ok(())
        } else {
            Err(SsdError::length_mismatch(self.sample_len, vector.len()))
        }
    }
}

impl<'a> IntoIterator for &'a TemplateTable {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_mirrors_rom() {
        let table = TemplateTable::reference();
        assert_eq!(table.len(), 10);
        assert_eq!(table.sample_len(), 3);
        let h = table.get(TemplateId::new(1)).unwrap();
        assert_eq!(h.label(), "MODELO_H");
        assert_eq!(h.samples(), &[100, 100, 100]);
        let t = table.get(TemplateId::new(9)).unwrap();
        assert_eq!(t.label(), "MODELO_T");
    }

    #[test]
    fn lookup_out_of_range() {
        let table = TemplateTable::reference();
        let err = table.get(TemplateId::new(10)).unwrap_err();
        assert!(matches!(err, SsdError::InvalidTemplateId { id: 10, count: 10 }));
    }

    #[test]
    fn rejects_ragged_table() {
        let result = TemplateTable::new(
            [("A", vec![1, 2, 3]), ("B", vec![1, 2])],
            &FieldLayout::REFERENCE,
        );
        assert!(matches!(result, Err(SsdError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_vectors_the_index_field_cannot_address() {
        let result = TemplateTable::new([("A", vec![1, 2, 3, 4])], &FieldLayout::REFERENCE);
        assert!(matches!(result, Err(SsdError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_more_templates_than_id_field() {
        let entries = (0..17).map(|i| (format!("T{i}"), vec![i; 3]));
        let result = TemplateTable::new(entries, &FieldLayout::REFERENCE);
        assert!(matches!(result, Err(SsdError::InvalidConfig { .. })));

        let entries = (0..16).map(|i| (format!("T{i}"), vec![i; 3]));
        assert_eq!(TemplateTable::new(entries, &FieldLayout::REFERENCE).unwrap().len(), 16);
    }

    #[test]
    fn rejects_empty_inputs() {
        let none: Vec<(String, Vec<i16>)> = Vec::new();
        assert!(TemplateTable::new(none, &FieldLayout::REFERENCE).is_err());
        assert!(FeatureVector::new(Vec::new()).is_err());
    }

    #[test]
    fn vector_length_checked_against_table() {
        let table = TemplateTable::reference();
        assert!(table.check_vector(&FeatureVector::reference()).is_ok());
        let short = FeatureVector::new(vec![1, 2]).unwrap();
        assert!(matches!(
            table.check_vector(&short),
            Err(SsdError::LengthMismatch { expected: 3, actual: 2 })
        ));
    }
}
