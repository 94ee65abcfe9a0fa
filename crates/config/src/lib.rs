use anyhow::{Context, Result};
use cwregs_core::{Register, NUM_BUFFERS, REGISTER_SET};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// The register-frame contract a host expects from the firmware.
///
/// The register list is compared against the compiled register set rather
/// than negotiated: a target built with a different set or order needs a
/// matching decoder, not a different config file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutManifest {
    pub schema_version: String,
    #[serde(default = "default_num_buffers")]
    pub num_buffers: usize,
    #[serde(default = "default_registers")]
    pub registers: Vec<String>,
}

fn default_num_buffers() -> usize {
    NUM_BUFFERS
}

fn default_registers() -> Vec<String> {
    REGISTER_SET.iter().map(|r| r.name().to_string()).collect()
}

impl Default for LayoutManifest {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            num_buffers: default_num_buffers(),
            registers: default_registers(),
        }
    }
}

impl LayoutManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open layout manifest at {:?}", path.as_ref()))?;
        let layout: Self =
            serde_yaml::from_reader(f).context("Failed to parse Layout Manifest YAML")?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        if !(1..=256).contains(&self.num_buffers) {
            anyhow::bail!(
                "'num_buffers' must be between 1 and 256, got {}",
                self.num_buffers
            );
        }

        if self.registers.len() != REGISTER_SET.len() {
            anyhow::bail!(
                "Register layout mismatch: manifest lists {} registers, decoder is built for {}",
                self.registers.len(),
                REGISTER_SET.len()
            );
        }

        for (i, (name, expected)) in self.registers.iter().zip(REGISTER_SET).enumerate() {
            match Register::from_name(name) {
                Some(reg) if reg == expected => {}
                Some(reg) => anyhow::bail!(
                    "Register layout mismatch at position {}: manifest has '{}', decoder expects '{}'",
                    i,
                    reg,
                    expected
                ),
                None => anyhow::bail!("Unknown register '{}' at position {}", name, i),
            }
        }

        Ok(())
    }

    /// Whether a frame header names a slot this layout allows.
    pub fn slot_in_range(&self, slot: u8) -> bool {
        usize::from(slot) < self.num_buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_layout() {
        let yaml = r#"
schema_version: "1.0"
num_buffers: 4
registers: [r0, r1, r2, r3, r4, r5, r6, r7, r8, r9, r10, r11, r12, sp]
"#;
        let layout: LayoutManifest = serde_yaml::from_str(yaml).unwrap();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.num_buffers, 4);
        assert!(layout.slot_in_range(3));
        assert!(!layout.slot_in_range(4));
    }

    #[test]
    fn test_defaults_match_builtin_contract() {
        let yaml = r#"
schema_version: "1.0"
"#;
        let layout: LayoutManifest = serde_yaml::from_str(yaml).unwrap();
        assert!(layout.validate().is_ok());
        assert_eq!(layout, LayoutManifest::default());
        assert_eq!(layout.num_buffers, 2);
        assert_eq!(layout.registers.last().map(String::as_str), Some("sp"));
    }

    #[test]
    fn test_r13_alias_accepted() {
        let mut layout = LayoutManifest::default();
        layout.registers[13] = "r13".to_string();
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
"#;
        let layout: LayoutManifest = serde_yaml::from_str(yaml).unwrap();
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }

    #[test]
    fn test_invalid_num_buffers() {
        let mut layout = LayoutManifest::default();
        layout.num_buffers = 0;
        assert!(layout.validate().unwrap_err().to_string().contains("num_buffers"));
        layout.num_buffers = 257;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_register_count_mismatch() {
        let mut layout = LayoutManifest::default();
        layout.registers.push("pc".to_string());
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("15 registers"));
    }

    #[test]
    fn test_register_order_mismatch() {
        let mut layout = LayoutManifest::default();
        layout.registers.swap(0, 1);
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("position 0"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
schema_version: "1.0"
num_regs: 15
"#;
        assert!(serde_yaml::from_str::<LayoutManifest>(yaml).is_err());
    }
}
