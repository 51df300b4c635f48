//! Read-only historical reference data.
//!
//! A store is loaded once and shared between callers. Queries that match nothing
//! return an empty sequence; downstream fallback logic relies on that.

use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Categorical columns a store can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Region,
    SoilType,
    Crop,
    City,
    Irrigation,
    Season,
}

/// Numeric columns a store can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ModalPrice,
    ExpectedReturnPerAcre,
    DemandScore,
    LandSize,
}

pub trait Record {
    fn field(&self, field: Field) -> Option<&str>;
    fn metric(&self, metric: Metric) -> Option<f64>;
}

/// One observed market price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub crop: String,
    pub city: String,
    pub modal_price: f64,
}

impl Record for PriceRecord {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Crop => Some(&self.crop),
            Field::City => Some(&self.city),
            _ => None,
        }
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::ModalPrice => Some(self.modal_price),
            _ => None,
        }
    }
}

/// Land-suitability history used by the recommendation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityRecord {
    pub region: String,
    pub soil_type: String,
    pub crop_type: String,
    pub irrigation: Option<String>,
    pub season: Option<String>,
    pub land_size: Option<f64>,
    pub expected_return_per_acre: f64,
    pub demand_score: f64,
}

impl Record for SuitabilityRecord {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Region => Some(&self.region),
            Field::SoilType => Some(&self.soil_type),
            Field::Crop => Some(&self.crop_type),
            Field::Irrigation => self.irrigation.as_deref(),
            Field::Season => self.season.as_deref(),
            Field::City => None,
        }
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::ExpectedReturnPerAcre => Some(self.expected_return_per_acre),
            Metric::DemandScore => Some(self.demand_score),
            Metric::LandSize => self.land_size,
            Metric::ModalPrice => None,
        }
    }
}

/// Row predicate. Values compare case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(Field, String),
    AnyOf(Field, Vec<String>),
}

impl Filter {
    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Filter::Equals(field, value.into())
    }

    pub fn any_of<I, S>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::AnyOf(field, values.into_iter().map(Into::into).collect())
    }

    fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Filter::Equals(field, value) => record
                .field(*field)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            Filter::AnyOf(field, values) => record
                .field(*field)
                .is_some_and(|v| values.iter().any(|c| v.eq_ignore_ascii_case(c))),
        }
    }
}

/// Mean metrics for one group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub key: String,
    pub count: usize,
    pub metrics: BTreeMap<Metric, f64>,
}

impl GroupAggregate {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

#[derive(Debug, Clone)]
pub struct HistoricalStore<R> {
    name: String,
    records: Vec<R>,
}

impl<R: Record> HistoricalStore<R> {
    pub fn new(name: impl Into<String>, records: Vec<R>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows matching every filter, in dataset order.
    pub fn query(&self, filters: &[Filter]) -> Vec<&R> {
        self.records
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(*r)))
            .collect()
    }

    /// Groups matching rows by `group_by` and averages each metric.
    ///
    /// Keys compare case-insensitively like filters do; each group reports
    /// the first-seen spelling and groups come back ordered by folded key.
    /// Rows without the group field are skipped; a metric no row in the
    /// group carries is left out of that group.
    pub fn aggregate(
        &self,
        filters: &[Filter],
        group_by: Field,
        metrics: &[Metric],
    ) -> Vec<GroupAggregate> {
        let mut groups: BTreeMap<String, (&str, Vec<&R>)> = BTreeMap::new();
        for record in self.query(filters) {
            if let Some(key) = record.field(group_by) {
                groups
                    .entry(key.to_lowercase())
                    .or_insert_with(|| (key, Vec::new()))
                    .1
                    .push(record);
            }
        }

        groups
            .into_values()
            .map(|(key, rows)| {
                let mut values = BTreeMap::new();
                for &metric in metrics {
                    let samples: Vec<f64> = rows.iter().filter_map(|r| r.metric(metric)).collect();
                    if !samples.is_empty() {
                        values.insert(metric, samples.iter().mean());
                    }
                }
                GroupAggregate {
                    key: key.to_string(),
                    count: rows.len(),
                    metrics: values,
                }
            })
            .collect()
    }

    /// Distinct values of `field` among matching rows, in first-seen order.
    pub fn distinct(&self, field: Field, filters: &[Filter]) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.query(filters).into_iter().filter_map(|r| r.field(field)) {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(value)) {
                seen.push(value.to_string());
            }
        }
        seen
    }
}
