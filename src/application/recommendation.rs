//! Crop recommendation: classifier inference reconciled against suitability history.

use crate::application::ml::predictor::CropClassifier;
use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::{AdvisoryError, AdvisoryResult, PredictionError, ValidationError};
use crate::domain::history::{Field, Filter, HistoricalStore, Metric, SuitabilityRecord};
use crate::domain::ml::feature_registry::{FeatureContext, FeatureSchema};
use crate::domain::recommendation::{RecommendationCandidate, RecommendationQuery};
use tracing::{debug, info, warn};

/// Hard cap on returned recommendations.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Number of top-probability classes taken as candidates.
const CANDIDATE_CLASSES: usize = 3;

#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub schema: FeatureSchema,
    pub max_results: usize,
    /// Below this many distinct crops the query widens to the whole region.
    pub min_distinct_crops: usize,
}

pub struct RecommendationRanker<'a> {
    pub classifier: &'a dyn CropClassifier,
    pub history: &'a HistoricalStore<SuitabilityRecord>,
    pub encoder: &'a CategoricalEncoder,
    pub settings: &'a RecommendationSettings,
}

/// Query input after validation, in canonical spelling.
struct ValidatedQuery<'q> {
    region: &'q str,
    soil_type: &'q str,
    irrigation: Option<&'q str>,
    season: Option<&'q str>,
    land_area: f64,
}

impl RecommendationRanker<'_> {
    pub fn recommend(&self, query: &RecommendationQuery) -> AdvisoryResult<Vec<RecommendationCandidate>> {
        let validated = self.validate(query)?;

        let candidates = self.candidate_crops(&validated)?;
        debug!("Model candidates for {} / {}: {:?}", validated.region, validated.soil_type, candidates);

        let mut filters = vec![
            Filter::eq(Field::Region, validated.region),
            Filter::eq(Field::SoilType, validated.soil_type),
        ];
        if let Some(irrigation) = validated.irrigation {
            filters.push(Filter::eq(Field::Irrigation, irrigation));
        }
        if let Some(season) = validated.season {
            filters.push(Filter::eq(Field::Season, season));
        }
        filters.push(Filter::any_of(Field::Crop, candidates.iter().cloned()));

        let matched = self.history.distinct(Field::Crop, &filters).len();
        if matched < self.settings.min_distinct_crops {
            warn!(
                "Only {} matching crop(s) for {} / {}; widening to all crops in region",
                matched, validated.region, validated.soil_type
            );
            filters = vec![Filter::eq(Field::Region, validated.region)];
        }

        let mut ranked: Vec<RecommendationCandidate> = self
            .history
            .aggregate(
                &filters,
                Field::Crop,
                &[Metric::ExpectedReturnPerAcre, Metric::DemandScore],
            )
            .into_iter()
            .filter_map(|group| {
                let expected = group.metric(Metric::ExpectedReturnPerAcre)?;
                let demand = group.metric(Metric::DemandScore)?;
                Some(RecommendationCandidate::new(group.key, expected, demand, validated.land_area))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.dynamic_expected_return
                .total_cmp(&a.dynamic_expected_return)
                .then(b.demand_score.total_cmp(&a.demand_score))
                .then_with(|| a.crop_type.cmp(&b.crop_type))
        });
        ranked.truncate(self.settings.max_results.min(MAX_RECOMMENDATIONS));

        info!(
            "Recommended {} crop(s) for {} / {} on {} acres",
            ranked.len(),
            validated.region,
            validated.soil_type,
            validated.land_area
        );
        Ok(ranked)
    }

    fn validate<'q>(&'q self, query: &'q RecommendationQuery) -> Result<ValidatedQuery<'q>, ValidationError> {
        if !query.land_area.is_finite() || query.land_area <= 0.0 {
            return Err(ValidationError::NonPositiveLandArea {
                land_area: query.land_area,
            });
        }

        Ok(ValidatedQuery {
            region: self.encoder.canonicalize(Category::Region, &query.region)?,
            soil_type: self.encoder.canonicalize(Category::SoilType, &query.soil_type)?,
            irrigation: self.optional(Category::Irrigation, query.irrigation.as_deref())?,
            season: self.optional(Category::Season, query.season.as_deref())?,
            land_area: query.land_area,
        })
    }

    /// Optional inputs are only checked when the profile defines a vocabulary for them.
    fn optional<'q>(
        &'q self,
        category: Category,
        value: Option<&'q str>,
    ) -> Result<Option<&'q str>, ValidationError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) if self.encoder.has(category) => self.encoder.canonicalize(category, v).map(Some),
            Some(v) => Ok(Some(v)),
        }
    }

    fn candidate_crops(&self, query: &ValidatedQuery<'_>) -> AdvisoryResult<Vec<String>> {
        let ctx = FeatureContext {
            soil_type: Some(query.soil_type),
            region: Some(query.region),
            land_size: Some(query.land_area),
            irrigation: query.irrigation,
            season: query.season,
            ..Default::default()
        };
        let features = self.settings.schema.assemble(&ctx, self.encoder)?;

        let classes = match self.classifier.predict_proba(&features) {
            Some(probabilities) => top_classes(&probabilities?, CANDIDATE_CLASSES),
            None => vec![self.classifier.predict_class(&features)?],
        };

        let known = self.encoder.vocabulary(Category::Crop).len();
        classes
            .into_iter()
            .map(|index| {
                u32::try_from(index)
                    .ok()
                    .and_then(|code| self.encoder.decode(Category::Crop, code).ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AdvisoryError::from(PredictionError::UnknownClass {
                            model: self.classifier.name().to_string(),
                            index,
                            classes: known,
                        })
                    })
            })
            .collect()
    }
}

/// Indices of the `n` most probable classes, ties broken by lower index.
fn top_classes(probabilities: &[f64], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| {
        probabilities[b]
            .total_cmp(&probabilities[a])
            .then(a.cmp(&b))
    });
    indices.truncate(n);
    indices
}
