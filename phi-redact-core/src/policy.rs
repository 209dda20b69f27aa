//! Policy: the per-`PhiType` enable/threshold/replacement map the reconciler
//! and applier consult (§3, §6).

use std::collections::HashMap;

use error_common::{RedactionError, RedactionResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::span::PhiType;

/// How a redacted span is rendered in the output text (§6 `replacementStyle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStyle {
    Brackets,
    Asterisks,
    Empty,
    Token,
}

impl Default for ReplacementStyle {
    fn default() -> Self {
        ReplacementStyle::Brackets
    }
}

/// Per-type policy entry.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct PhiTypePolicy {
    pub enabled: bool,
    /// `{}` is substituted with a stable token id when `ReplacementStyle::Token`
    /// is active and the template contains it; otherwise used verbatim.
    pub replacement_template: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_confidence: f32,
}

impl Default for PhiTypePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            replacement_template: None,
            min_confidence: 0.5,
        }
    }
}

/// A map from `PhiType` to its policy entry, plus the global replacement
/// style and optional per-type overrides supplied at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub replacement_style: ReplacementStyle,
    pub types: HashMap<PhiType, PhiTypePolicy>,
}

impl Policy {
    /// A policy that enables every `PhiType` at the same default threshold.
    pub fn default_policy() -> Self {
        let mut types = HashMap::new();
        for phi_type in PhiType::all() {
            types.insert(*phi_type, PhiTypePolicy::default());
        }
        Self {
            name: "default".to_string(),
            replacement_style: ReplacementStyle::Brackets,
            types,
        }
    }

    pub fn entry(&self, phi_type: PhiType) -> PhiTypePolicy {
        self.types.get(&phi_type).cloned().unwrap_or_default()
    }

    pub fn is_enabled(&self, phi_type: PhiType) -> bool {
        self.entry(phi_type).enabled
    }

    pub fn min_confidence(&self, phi_type: PhiType) -> f32 {
        self.entry(phi_type).min_confidence
    }

    /// Applies `enabledTypes`/`disabledTypes`/`customReplacements` from
    /// [`RedactionOptions`] on top of this policy, returning a new policy.
    /// `enabledTypes` narrows the set considered; `disabledTypes` is applied
    /// after, per §6 ("applied after enabled").
    pub fn with_options(&self, options: &RedactionOptions) -> Self {
        let mut policy = self.clone();

        if let Some(replacement_style) = options.replacement_style {
            policy.replacement_style = replacement_style;
        }

        if let Some(enabled_types) = &options.enabled_types {
            for phi_type in PhiType::all() {
                let entry = policy.types.entry(*phi_type).or_default();
                entry.enabled = enabled_types.contains(phi_type);
            }
        }

        if let Some(disabled_types) = &options.disabled_types {
            for phi_type in disabled_types {
                policy.types.entry(*phi_type).or_default().enabled = false;
            }
        }

        for (phi_type, template) in &options.custom_replacements {
            policy.types.entry(*phi_type).or_default().replacement_template = Some(template.clone());
        }

        policy
    }

    /// Rejects configuration that doesn't type-check against the closed
    /// `PhiType` enumeration or carries an out-of-range threshold. Per §6,
    /// invalid configuration is rejected outright, never silently merged.
    pub fn validate_policy(&self) -> RedactionResult<()> {
        for (phi_type, entry) in &self.types {
            if !(0.0..=1.0).contains(&entry.min_confidence) {
                return Err(RedactionError::config(format!(
                    "min_confidence for {phi_type} must be in [0,1], got {}",
                    entry.min_confidence
                )));
            }
        }
        Ok(())
    }
}

/// Caller-supplied overrides for a single `redact`/`redactStreaming` call
/// (§6 Options).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionOptions {
    pub enabled_types: Option<Vec<PhiType>>,
    pub disabled_types: Option<Vec<PhiType>>,
    pub replacement_style: Option<ReplacementStyle>,
    #[serde(default)]
    pub custom_replacements: HashMap<PhiType, String>,
    pub policy_name: Option<String>,
    /// Feeds the threshold-composition factor in §4.4; defaults to
    /// `Treatment` when unset.
    pub purpose_of_use: Option<crate::context::PurposeOfUse>,
}
