use crate::domain::errors::{ConfigError, ForecastError};
use std::collections::BTreeMap;

/// Per-crop, per-calendar-month price multipliers.
///
/// Crops are keyed case-insensitively. A crop or month without an entry is a
/// hard failure at lookup time; multipliers are never defaulted.
#[derive(Debug, Clone, Default)]
pub struct SeasonalTable {
    profiles: BTreeMap<String, BTreeMap<u32, f64>>,
}

impl SeasonalTable {
    pub fn new(profiles: BTreeMap<String, BTreeMap<u32, f64>>) -> Result<Self, ConfigError> {
        let mut normalized = BTreeMap::new();
        for (crop, months) in profiles {
            for (&month, &index) in &months {
                if !(1..=12).contains(&month) {
                    return Err(ConfigError::InvalidProfile {
                        reason: format!("seasonal index for {} uses month {}", crop, month),
                    });
                }
                if !index.is_finite() || index <= 0.0 {
                    return Err(ConfigError::InvalidProfile {
                        reason: format!(
                            "seasonal index for {} month {} must be positive, got {}",
                            crop, month, index
                        ),
                    });
                }
            }
            normalized.insert(crop.trim().to_lowercase(), months);
        }
        Ok(Self {
            profiles: normalized,
        })
    }

    pub fn has_profile(&self, crop: &str) -> bool {
        self.profiles.contains_key(&crop.trim().to_lowercase())
    }

    pub fn lookup(&self, crop: &str, month: u32) -> Result<f64, ForecastError> {
        let profile = self
            .profiles
            .get(&crop.trim().to_lowercase())
            .ok_or_else(|| ForecastError::UnknownSeasonalProfile {
                crop: crop.to_string(),
                month: None,
            })?;
        profile
            .get(&month)
            .copied()
            .ok_or_else(|| ForecastError::UnknownSeasonalProfile {
                crop: crop.to_string(),
                month: Some(month),
            })
    }
}
