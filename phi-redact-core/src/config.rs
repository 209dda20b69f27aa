//! Deserializable configuration surfaces (§6): threshold overrides, feature
//! flags, calibration tables, and post-filter rules. Each type validates
//! itself before a [`crate::Runtime`] accepts it, rejecting malformed
//! configuration outright rather than silently falling back to defaults.

use std::collections::HashMap;

use error_common::{MessageSanitizer, RedactionError, RedactionResult};
use serde::{Deserialize, Serialize};

use crate::span::PhiType;
use crate::whitelist::PostFilterRules;

/// Validates a deserialized configuration document. Implemented by every
/// type loaded from `ThresholdsFile`/`FeaturesFile`/`CalibrationFile`/
/// `PostFilterRules` so [`crate::Runtime::with_config`] has one call site
/// for rejecting bad input (§6).
pub trait ConfigValidator {
    fn validate(&self) -> RedactionResult<()>;
}

/// Per-type base-threshold overrides, layered on top of the built-in
/// defaults in `thresholds.rs` (§4.4, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdsFile {
    #[serde(default)]
    pub overrides: HashMap<PhiType, f32>,
}

impl ConfigValidator for ThresholdsFile {
    fn validate(&self) -> RedactionResult<()> {
        for (phi_type, value) in &self.overrides {
            if !(0.0..=1.0).contains(value) {
                return Err(RedactionError::config(format!(
                    "threshold override for {phi_type} must be in [0,1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Which optional pipeline stages run (§6): both default to on; a caller
/// integrating this crate into a latency-sensitive path may disable the
/// phonetic/learned families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesFile {
    #[serde(default = "default_true")]
    pub phonetic_detection: bool,
    #[serde(default = "default_true")]
    pub learned_detection: bool,
    #[serde(default = "default_true")]
    pub feedback_learning: bool,
    #[serde(default)]
    pub ocr_normalization: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeaturesFile {
    fn default() -> Self {
        Self {
            phonetic_detection: true,
            learned_detection: true,
            feedback_learning: true,
            ocr_normalization: false,
        }
    }
}

impl ConfigValidator for FeaturesFile {
    fn validate(&self) -> RedactionResult<()> {
        Ok(())
    }
}

/// Document-type and specialty threshold-factor overrides, letting a
/// deployment recalibrate the multiplicative composition (§4.4) without a
/// code change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationFile {
    #[serde(default)]
    pub document_type_factors: HashMap<String, f32>,
    #[serde(default)]
    pub specialty_factors: HashMap<String, f32>,
}

impl ConfigValidator for CalibrationFile {
    fn validate(&self) -> RedactionResult<()> {
        for (key, value) in self.document_type_factors.iter().chain(self.specialty_factors.iter()) {
            if !(0.0..=2.0).contains(value) {
                return Err(RedactionError::config(format!(
                    "calibration factor for '{key}' must be in [0,2], got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl ConfigValidator for PostFilterRules {
    fn validate(&self) -> RedactionResult<()> {
        if self.extra_non_phi_terms.iter().any(|term| term.trim().is_empty()) {
            return Err(RedactionError::config("extra_non_phi_terms entries must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Parses a JSON or YAML configuration document and validates it: "parse,
/// then validate, never accept an invalid config silently", the same shape
/// `TextProcessingConfig`'s `#[serde(default)]` fields plus an explicit
/// `Default` impl follow one layer up.
pub fn load_json<T>(data: &str) -> RedactionResult<T>
where
    T: for<'de> Deserialize<'de> + ConfigValidator,
{
    let parsed: T = serde_json::from_str(data).map_err(|e| {
        let snippet = MessageSanitizer::new().truncate(data);
        RedactionError::config(format!("invalid JSON configuration: {e} (near \"{snippet}\")"))
    })?;
    parsed.validate()?;
    Ok(parsed)
}

pub fn load_yaml<T>(data: &str) -> RedactionResult<T>
where
    T: for<'de> Deserialize<'de> + ConfigValidator,
{
    let parsed: T = serde_yaml::from_str(data).map_err(|e| {
        let snippet = MessageSanitizer::new().truncate(data);
        RedactionError::config(format!("invalid YAML configuration: {e} (near \"{snippet}\")"))
    })?;
    parsed.validate()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_file_rejects_out_of_range_override() {
        let mut overrides = HashMap::new();
        overrides.insert(PhiType::Ssn, 1.5);
        let file = ThresholdsFile { overrides };
        assert!(file.validate().is_err());
    }

    #[test]
    fn features_file_defaults_enable_every_optional_stage_but_ocr() {
        let features = FeaturesFile::default();
        assert!(features.phonetic_detection);
        assert!(features.learned_detection);
        assert!(features.feedback_learning);
        assert!(!features.ocr_normalization);
    }

    #[test]
    fn load_json_rejects_malformed_input() {
        let result: RedactionResult<ThresholdsFile> = load_json("{not json");
        assert!(result.is_err());
    }

    #[test]
    fn load_yaml_parses_and_validates_a_calibration_file() {
        let yaml = "document_type_factors:\n  clinical_note: 0.85\nspecialty_factors: {}\n";
        let loaded: CalibrationFile = load_yaml(yaml).unwrap_or_else(|_| panic!("expected valid calibration file"));
        assert_eq!(loaded.document_type_factors.get("clinical_note").copied(), Some(0.85));
    }
}
