use serde::Serialize;

/// Caller input for a crop recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub region: String,
    pub soil_type: String,
    pub land_area: f64,
    pub irrigation: Option<String>,
    pub season: Option<String>,
}

impl RecommendationQuery {
    pub fn new(region: impl Into<String>, soil_type: impl Into<String>, land_area: f64) -> Self {
        Self {
            region: region.into(),
            soil_type: soil_type.into(),
            land_area,
            irrigation: None,
            season: None,
        }
    }

    pub fn with_irrigation(mut self, irrigation: impl Into<String>) -> Self {
        self.irrigation = Some(irrigation.into());
        self
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCandidate {
    pub crop_type: String,
    pub expected_return_per_acre: f64,
    pub demand_score: f64,
    pub dynamic_expected_return: f64,
}

impl RecommendationCandidate {
    pub fn new(crop_type: String, expected_return_per_acre: f64, demand_score: f64, land_area: f64) -> Self {
        Self {
            crop_type,
            expected_return_per_acre,
            demand_score,
            dynamic_expected_return: expected_return_per_acre * land_area,
        }
    }
}
