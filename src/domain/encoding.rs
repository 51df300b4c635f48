//! Categorical encoding between domain vocabularies and model inputs.
//!
//! Codes are positions in the vocabulary list. The lists are loaded from the
//! advisory profile and must match the vocabulary each model artifact was
//! trained with; any reordering is a breaking change for fitted models.

use crate::domain::errors::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SoilType,
    Region,
    Crop,
    Irrigation,
    Season,
}

impl Category {
    pub fn field_name(&self) -> &'static str {
        match self {
            Category::SoilType => "soil_type",
            Category::Region => "region",
            Category::Crop => "crop",
            Category::Irrigation => "irrigation",
            Category::Season => "season",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Static encoding tables, one vocabulary per category.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    version: String,
    tables: BTreeMap<Category, Vec<String>>,
}

impl CategoricalEncoder {
    pub fn new(
        version: impl Into<String>,
        tables: BTreeMap<Category, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        for (category, values) in &tables {
            if values.is_empty() {
                return Err(ConfigError::InvalidProfile {
                    reason: format!("vocabulary for {} is empty", category),
                });
            }
            for (i, value) in values.iter().enumerate() {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidProfile {
                        reason: format!("vocabulary for {} has a blank entry", category),
                    });
                }
                if values[..i].iter().any(|v| v.eq_ignore_ascii_case(value)) {
                    return Err(ConfigError::InvalidProfile {
                        reason: format!("vocabulary for {} lists '{}' twice", category, value),
                    });
                }
            }
        }

        Ok(Self {
            version: version.into(),
            tables,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn has(&self, category: Category) -> bool {
        self.tables.contains_key(&category)
    }

    /// Accepted values for a category, in code order. Empty if the category is not configured.
    pub fn vocabulary(&self, category: Category) -> &[String] {
        self.tables.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolves user input to the vocabulary's canonical spelling.
    pub fn canonicalize(&self, category: Category, value: &str) -> Result<&str, ValidationError> {
        let code = self.encode(category, value)?;
        Ok(&self.vocabulary(category)[code as usize])
    }

    pub fn encode(&self, category: Category, value: &str) -> Result<u32, ValidationError> {
        let needle = value.trim();
        self.vocabulary(category)
            .iter()
            .position(|v| v.eq_ignore_ascii_case(needle))
            .map(|i| i as u32)
            .ok_or_else(|| ValidationError::InvalidCategory {
                field: category.field_name().to_string(),
                value: value.to_string(),
                accepted: self.vocabulary(category).to_vec(),
            })
    }

    pub fn decode(&self, category: Category, code: u32) -> Result<&str, ValidationError> {
        self.vocabulary(category)
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| ValidationError::UnknownCode {
                field: category.field_name().to_string(),
                code,
            })
    }

    /// One-hot indicator vector in vocabulary order.
    pub fn one_hot(&self, category: Category, value: &str) -> Result<Vec<f64>, ValidationError> {
        let code = self.encode(category, value)? as usize;
        let mut out = vec![0.0; self.vocabulary(category).len()];
        out[code] = 1.0;
        Ok(out)
    }

    /// Fails when a model was trained against a different vocabulary.
    pub fn ensure_matches(
        &self,
        category: Category,
        trained: &[String],
        model: &str,
    ) -> Result<(), ConfigError> {
        let profile = self.vocabulary(category);
        let same = profile.len() == trained.len()
            && profile
                .iter()
                .zip(trained)
                .all(|(a, b)| a.eq_ignore_ascii_case(b));
        if same {
            Ok(())
        } else {
            Err(ConfigError::VocabularyMismatch {
                model: model.to_string(),
                field: category.field_name().to_string(),
                profile: profile.to_vec(),
                artifact: trained.to_vec(),
            })
        }
    }
}
