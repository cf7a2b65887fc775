//! Classifier configuration
//!
//! Everything platform-specific lives here: where the register block is
//! mapped, which vector to classify, and the template table mirrored from the
//! accelerator ROM. Every section is optional; omitted sections fall back to
//! the reference bench setup.
//!
//! ```toml
//! vector = [2, 20, 10]
//!
//! [accelerator]
//! device = "/dev/mem"       # names the accelerator; auto selection maps only this
//! base = 0xFF200000
//! span = 0x40
//! control = 0x00
//! data_in = 0x10
//! status = 0x20
//! result_out = 0x30
//! # max_polls = 1_000_000   # opt into a bounded completion wait
//!
//! [[template]]
//! label = "MODELO_Z"
//! samples = [1, 2, 3]
//! ```

use crate::error::{Result, SsdError};
use crate::link::CompletionWait;
use crate::template::{FeatureVector, TemplateTable};
use serde::Deserialize;
use ssd_chip::{regs, FieldLayout, Register};
use std::path::{Path, PathBuf};

/// Typical physical base of the lightweight HPS-to-FPGA bridge on Cyclone V
/// SoC boards, where the accelerator PIO ports are usually placed.
pub const DEFAULT_BASE: u64 = 0xFF20_0000;

/// Device file used to reach physical memory.
pub const DEFAULT_DEVICE: &str = "/dev/mem";

/// Where and how the accelerator register block is reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcceleratorConfig {
    /// Device file to map (`/dev/mem`, `/dev/uioN`)
    ///
    /// Unset means no accelerator was named: [`BackendSelection::Auto`]
    /// then stays on the model, and only an explicit MMIO selection falls
    /// back to [`DEFAULT_DEVICE`].
    ///
    /// [`BackendSelection::Auto`]: crate::BackendSelection::Auto
    pub device: Option<PathBuf>,
    /// Physical base of the register block (offset into `device`)
    pub base: u64,
    /// Bytes to map starting at `base`
    pub span: usize,
    /// Control port offset
    pub control: usize,
    /// Data-in port offset
    pub data_in: usize,
    /// Status port offset
    pub status: usize,
    /// Result-out port offset
    pub result_out: usize,
    /// Give up after this many status reads instead of spinning forever
    pub max_polls: Option<u64>,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            device: None,
            base: DEFAULT_BASE,
            span: regs::BLOCK_SPAN,
            control: Register::Control.default_offset(),
            data_in: Register::DataIn.default_offset(),
            status: Register::Status.default_offset(),
            result_out: Register::ResultOut.default_offset(),
            max_polls: None,
        }
    }
}

impl AcceleratorConfig {
    /// Offset of `reg` inside the mapped window.
    pub const fn offset(&self, reg: Register) -> usize {
        match reg {
            Register::Control => self.control,
            Register::DataIn => self.data_in,
            Register::Status => self.status,
            Register::ResultOut => self.result_out,
        }
    }

    /// Device file an MMIO backend maps.
    pub fn device_path(&self) -> &Path {
        self.device
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DEVICE))
    }

    /// Completion wait selected by `max_polls`.
    pub const fn wait(&self) -> CompletionWait {
        match self.max_polls {
            Some(max_polls) => CompletionWait::Bounded { max_polls },
            None => CompletionWait::Unbounded,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.span < regs::REGISTER_WIDTH {
            return Err(SsdError::invalid_config(format!(
                "accelerator span {:#x} is smaller than one register",
                self.span
            )));
        }
        for reg in Register::ALL {
            let offset = self.offset(reg);
            if offset % regs::REGISTER_WIDTH != 0 {
                return Err(SsdError::invalid_config(format!(
                    "{reg} offset {offset:#x} is not 4-byte aligned"
                )));
            }
            if offset + regs::REGISTER_WIDTH > self.span {
                return Err(SsdError::invalid_config(format!(
                    "{reg} offset {offset:#x} lies outside the {:#x}-byte window",
                    self.span
                )));
            }
        }
        if self.max_polls == Some(0) {
            return Err(SsdError::invalid_config("max_polls must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateEntry {
    label: String,
    samples: Vec<i16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    accelerator: AcceleratorConfig,
    vector: Option<Vec<i16>>,
    #[serde(default, rename = "template")]
    templates: Vec<TemplateEntry>,
}

/// Validated configuration for one classification run.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    accelerator: AcceleratorConfig,
    layout: FieldLayout,
    vector: FeatureVector,
    templates: TemplateTable,
}

impl ClassifierConfig {
    /// Reference bench setup: ROM mirror, captured vector, default mapping.
    pub fn reference() -> Self {
        Self {
            accelerator: AcceleratorConfig::default(),
            layout: FieldLayout::REFERENCE,
            vector: FeatureVector::reference(),
            templates: TemplateTable::reference(),
        }
    }

    /// Assemble and validate a configuration from parts.
    ///
    /// # Errors
    ///
    /// Returns error if the mapping is malformed or the vector does not
    /// match the template length.
    pub fn new(
        accelerator: AcceleratorConfig,
        vector: FeatureVector,
        templates: TemplateTable,
    ) -> Result<Self> {
        accelerator.validate()?;
        templates.check_vector(&vector)?;
        Ok(Self {
            accelerator,
            layout: FieldLayout::REFERENCE,
            vector,
            templates,
        })
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns error if the document does not parse or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| SsdError::invalid_config(e.to_string()))?;

        let layout = FieldLayout::REFERENCE;
        let templates = if file.templates.is_empty() {
            TemplateTable::reference()
        } else {
            TemplateTable::new(
                file.templates.into_iter().map(|t| (t.label, t.samples)),
                &layout,
            )?
        };
        let vector = match file.vector {
            Some(samples) => FeatureVector::new(samples)?,
            None => FeatureVector::reference(),
        };

        Self::new(file.accelerator, vector, templates)
    }

    /// Load a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable, or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SsdError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            "Loaded {} templates × {} samples from {}",
            config.templates.len(),
            config.templates.sample_len(),
            path.display()
        );
        Ok(config)
    }

    /// Override the completion wait bound.
    ///
    /// # Errors
    ///
    /// Returns error if `max_polls` is `Some(0)`.
    pub fn with_max_polls(mut self, max_polls: Option<u64>) -> Result<Self> {
        self.accelerator.max_polls = max_polls;
        self.accelerator.validate()?;
        Ok(self)
    }

    /// Register block mapping.
    pub const fn accelerator(&self) -> &AcceleratorConfig {
        &self.accelerator
    }

    /// Control/status bit layout.
    pub const fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Vector to classify.
    pub const fn vector(&self) -> &FeatureVector {
        &self.vector
    }

    /// Template table.
    pub const fn templates(&self) -> &TemplateTable {
        &self.templates
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_reference() {
        let config = ClassifierConfig::from_toml_str("").unwrap();
        assert_eq!(config.templates(), &TemplateTable::reference());
        assert_eq!(config.vector(), &FeatureVector::reference());
        assert_eq!(config.accelerator(), &AcceleratorConfig::default());
        assert_eq!(config.accelerator().wait(), CompletionWait::Unbounded);
    }

    #[test]
    fn full_document() {
        let config = ClassifierConfig::from_toml_str(
            r#"
            vector = [-4, 9]

            [accelerator]
            device = "/dev/uio0"
            base = 0
            span = 0x1000
            control = 0x100
            data_in = 0x110
            status = 0x120
            result_out = 0x130
            max_polls = 5000

            [[template]]
            label = "low"
            samples = [0, 0]

            [[template]]
            label = "high"
            samples = [10, 10]
            "#,
        )
        .unwrap();

        assert_eq!(config.templates().len(), 2);
        assert_eq!(config.vector().samples(), &[-4, 9]);
        assert_eq!(
            config.accelerator().device,
            Some(PathBuf::from("/dev/uio0"))
        );
        assert_eq!(config.accelerator().device_path(), Path::new("/dev/uio0"));
        assert_eq!(config.accelerator().offset(Register::Status), 0x120);
        assert_eq!(
            config.accelerator().wait(),
            CompletionWait::Bounded { max_polls: 5000 }
        );
    }

    #[test]
    fn no_device_unless_named() {
        let config = ClassifierConfig::from_toml_str("[accelerator]\nbase = 0x1000").unwrap();
        assert_eq!(config.accelerator().device, None);
        assert_eq!(config.accelerator().device_path(), Path::new(DEFAULT_DEVICE));
        assert_eq!(ClassifierConfig::reference().accelerator().device, None);
    }

    #[test]
    fn vector_must_match_templates() {
        let err = ClassifierConfig::from_toml_str("vector = [1, 2]").unwrap_err();
        assert!(matches!(err, SsdError::LengthMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn rejects_misaligned_and_out_of_window_offsets() {
        let misaligned = "[accelerator]\ncontrol = 0x02";
        assert!(matches!(
            ClassifierConfig::from_toml_str(misaligned),
            Err(SsdError::InvalidConfig { .. })
        ));
        let outside = "[accelerator]\nspan = 0x20";
        assert!(matches!(
            ClassifierConfig::from_toml_str(outside),
            Err(SsdError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(ClassifierConfig::from_toml_str("[accelerator]\nbogus = 1").is_err());
    }

    #[test]
    fn zero_poll_bound_rejected() {
        assert!(ClassifierConfig::reference().with_max_polls(Some(0)).is_err());
        let bounded = ClassifierConfig::reference().with_max_polls(Some(10)).unwrap();
        assert_eq!(bounded.accelerator().wait(), CompletionWait::Bounded { max_polls: 10 });
    }

    #[test]
    fn missing_file() {
        let err = ClassifierConfig::load(Path::new("/nonexistent/ssd.toml")).unwrap_err();
        assert!(matches!(err, SsdError::ConfigNotFound { .. }));
    }
}
