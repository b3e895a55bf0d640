//! Views: how recorded measurements are aggregated

use crate::measure::Measure;
use crate::tags::Tags;

/// How measurements for one tag combination are combined
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Number of measurements
    Count,
    /// Sum of measured values
    Sum,
    /// Most recent value
    LastValue,
    /// Histogram over the given upper bounds
    Distribution(Vec<f64>),
}

/// Aggregated value of one row
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationData {
    Count(u64),
    Sum(f64),
    LastValue(f64),
    Distribution(DistributionData),
}

/// Histogram state. `bucket_counts` has one more entry than the bounds,
/// counting values above the last bound.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionData {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub bucket_counts: Vec<u64>,
}

impl AggregationData {
    pub(crate) fn new(aggregation: &Aggregation, value: f64) -> Self {
        match aggregation {
            Aggregation::Count => AggregationData::Count(1),
            Aggregation::Sum => AggregationData::Sum(value),
            Aggregation::LastValue => AggregationData::LastValue(value),
            Aggregation::Distribution(bounds) => {
                let mut bucket_counts = vec![0; bounds.len() + 1];
                bucket_counts[bucket_index(bounds, value)] = 1;
                AggregationData::Distribution(DistributionData {
                    count: 1,
                    sum: value,
                    min: value,
                    max: value,
                    bucket_counts,
                })
            }
        }
    }

    pub(crate) fn add(&mut self, aggregation: &Aggregation, value: f64) {
        match (self, aggregation) {
            (AggregationData::Count(count), _) => *count += 1,
            (AggregationData::Sum(sum), _) => *sum += value,
            (AggregationData::LastValue(last), _) => *last = value,
            (AggregationData::Distribution(dist), Aggregation::Distribution(bounds)) => {
                dist.count += 1;
                dist.sum += value;
                dist.min = dist.min.min(value);
                dist.max = dist.max.max(value);
                if let Some(bucket) = dist.bucket_counts.get_mut(bucket_index(bounds, value)) {
                    *bucket += 1;
                }
            }
            (AggregationData::Distribution(_), _) => {}
        }
    }
}

// Values equal to a bound fall into the next bucket.
fn bucket_index(bounds: &[f64], value: f64) -> usize {
    bounds.iter().take_while(|bound| value >= **bound).count()
}

/// Aggregates one measure, broken down by `tag_keys`
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub description: String,
    pub measure: Measure,
    pub aggregation: Aggregation,
    pub tag_keys: Vec<String>,
}

impl View {
    /// A view named after its measure, with no tag keys
    pub fn new(measure: &Measure, aggregation: Aggregation) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            measure: measure.clone(),
            aggregation,
            tag_keys: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tag_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The view name, defaulting to the measure name
    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            self.measure.name()
        } else {
            &self.name
        }
    }

    /// The view description, defaulting to the measure description
    pub fn description(&self) -> &str {
        if self.description.is_empty() {
            self.measure.description()
        } else {
            &self.description
        }
    }

    // Registration compares views with defaults applied.
    pub(crate) fn same_as(&self, other: &View) -> bool {
        self.name() == other.name()
            && self.measure == other.measure
            && self.aggregation == other.aggregation
            && self.tag_keys == other.tag_keys
    }
}

/// Aggregated data for one tag combination of a view
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tags: Tags,
    pub data: AggregationData,
}
