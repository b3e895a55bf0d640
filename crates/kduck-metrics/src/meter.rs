//! Meters: registered views and their aggregated rows
//!
//! Each meter keeps its own set of views. Recording a measurement updates
//! every view over that measure and forwards the value to the `metrics`
//! facade, so whatever exporter the process installed sees it too.

use std::collections::{BTreeMap, HashMap};

use metrics::Label;
use parking_lot::RwLock;

use crate::error::{MetricsError, Result};
use crate::measure::Measurement;
use crate::tags::{MetricResource, Tags};
use crate::view::{Aggregation, AggregationData, Row, View};

/// Label carrying the monitored resource type on forwarded metrics
pub const RESOURCE_TYPE_LABEL: &str = "resource_type";

struct RegisteredView {
    view: View,
    rows: BTreeMap<Tags, AggregationData>,
}

/// A set of views, optionally attributed to a monitored resource
pub struct Meter {
    resource: Option<MetricResource>,
    views: RwLock<HashMap<String, RegisteredView>>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    pub fn new() -> Self {
        Self {
            resource: None,
            views: RwLock::new(HashMap::new()),
        }
    }

    /// A meter whose forwarded metrics carry the resource's labels
    pub fn for_resource(resource: MetricResource) -> Self {
        Self {
            resource: Some(resource),
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn resource(&self) -> Option<&MetricResource> {
        self.resource.as_ref()
    }

    /// Register views.
    ///
    /// Registering a view identical to one already registered is a no-op; a
    /// different view under an existing name is an error, in which case
    /// none of `views` are registered.
    pub fn register(&self, views: &[View]) -> Result<()> {
        let mut registered = self.views.write();
        check_conflicts(&registered, views)?;

        for view in views {
            registered
                .entry(view.name().to_string())
                .or_insert_with(|| RegisteredView {
                    view: view.clone(),
                    rows: BTreeMap::new(),
                });
        }
        Ok(())
    }

    /// Unregister views by name, dropping their collected data
    pub fn unregister(&self, views: &[View]) {
        let mut registered = self.views.write();
        for view in views {
            registered.remove(view.name());
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.views.read().contains_key(name)
    }

    /// Whether no view is registered
    pub fn is_empty(&self) -> bool {
        self.views.read().is_empty()
    }

    /// Fail if [`Meter::register`] would reject `views`, without registering
    pub(crate) fn check_register(&self, views: &[View]) -> Result<()> {
        check_conflicts(&self.views.read(), views)
    }

    /// Record measurements under `tags`
    pub fn record(&self, tags: &Tags, measurements: &[Measurement]) {
        let mut forwarded = Vec::new();
        {
            let mut registered = self.views.write();
            for registered_view in registered.values_mut() {
                let view = &registered_view.view;
                for m in measurements.iter().filter(|m| *m.measure() == view.measure) {
                    let row_tags = tags.select(&view.tag_keys);
                    match registered_view.rows.get_mut(&row_tags) {
                        Some(data) => data.add(&view.aggregation, m.value()),
                        None => {
                            let data = AggregationData::new(&view.aggregation, m.value());
                            registered_view.rows.insert(row_tags.clone(), data);
                        }
                    }
                    forwarded.push((
                        view.name().to_string(),
                        view.aggregation.clone(),
                        row_tags,
                        m.value(),
                    ));
                }
            }
        }

        for (name, aggregation, row_tags, value) in forwarded {
            self.forward(name, &aggregation, &row_tags, value);
        }
    }

    /// Rows collected for the view `name`, ordered by tags
    pub fn retrieve_data(&self, name: &str) -> Result<Vec<Row>> {
        let registered = self.views.read();
        let view = registered
            .get(name)
            .ok_or_else(|| MetricsError::ViewNotRegistered {
                name: name.to_string(),
            })?;
        Ok(view
            .rows
            .iter()
            .map(|(tags, data)| Row {
                tags: tags.clone(),
                data: data.clone(),
            })
            .collect())
    }

    fn forward(&self, name: String, aggregation: &Aggregation, tags: &Tags, value: f64) {
        let labels = self.labels(tags);
        match aggregation {
            Aggregation::Count => metrics::counter!(name, labels).increment(1),
            // Sums can be fractional and counters only take u64.
            Aggregation::Sum => metrics::gauge!(name, labels).increment(value),
            Aggregation::LastValue => metrics::gauge!(name, labels).set(value),
            Aggregation::Distribution(_) => metrics::histogram!(name, labels).record(value),
        }
    }

    fn labels(&self, tags: &Tags) -> Vec<Label> {
        let mut labels: Vec<Label> = tags
            .iter()
            .map(|(k, v)| Label::new(k.to_string(), v.to_string()))
            .collect();
        if let Some(resource) = &self.resource {
            labels.push(Label::new(RESOURCE_TYPE_LABEL, resource.type_.clone()));
            labels.extend(
                resource
                    .labels
                    .iter()
                    .map(|(k, v)| Label::new(k.clone(), v.clone())),
            );
        }
        labels
    }
}

fn check_conflicts(registered: &HashMap<String, RegisteredView>, views: &[View]) -> Result<()> {
    for view in views {
        if let Some(existing) = registered.get(view.name()) {
            if !existing.view.same_as(view) {
                return Err(MetricsError::ViewConflict {
                    name: view.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

impl std::fmt::Debug for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.views.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Meter")
            .field("resource", &self.resource)
            .field("views", &names)
            .finish()
    }
}
