//! Process-wide recording
//!
//! Measurements recorded through [`record`] and [`record_batch`] go to the
//! meter of the context's resource (or the default meter), unless the
//! current [`MetricsConfig`] installs a custom recorder.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::measure::Measurement;
use crate::meter::Meter;
use crate::tags::{MetricResource, RecordContext};
use crate::view::View;

/// Receives measurements instead of the meters
pub type Recorder = Arc<dyn Fn(&RecordContext, &[Measurement]) + Send + Sync>;

/// Recording configuration for the process
#[derive(Clone, Default)]
pub struct MetricsConfig {
    /// Name of the component recording, used as the metrics domain
    pub component: String,
    /// Replaces meter recording when set
    pub recorder: Option<Recorder>,
}

impl std::fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("component", &self.component)
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

struct Meters {
    default: Arc<Meter>,
    by_resource: HashMap<MetricResource, Arc<Meter>>,
    /// Views every meter, including ones created later, must carry
    resource_views: Vec<View>,
}

static METERS: Lazy<RwLock<Meters>> = Lazy::new(|| {
    RwLock::new(Meters {
        default: Arc::new(Meter::new()),
        by_resource: HashMap::new(),
        resource_views: Vec::new(),
    })
});

static CURRENT_CONFIG: Lazy<RwLock<Option<MetricsConfig>>> = Lazy::new(|| RwLock::new(None));

/// The meter used for recordings without a resource
pub fn default_meter() -> Arc<Meter> {
    METERS.read().default.clone()
}

/// The meter for `resource`, created with all resource views on first use
pub fn meter_for_resource(resource: &MetricResource) -> Arc<Meter> {
    if let Some(meter) = METERS.read().by_resource.get(resource) {
        return meter.clone();
    }

    let mut meters = METERS.write();
    if let Some(meter) = meters.by_resource.get(resource) {
        return meter.clone();
    }
    let meter = Arc::new(Meter::for_resource(resource.clone()));
    // Views were already validated against the default meter.
    if let Err(e) = meter.register(&meters.resource_views) {
        debug!(error = %e, resource = %resource.type_, "resource view registration failed");
    }
    meters.by_resource.insert(resource.clone(), meter.clone());
    meter
}

/// Register views with the default meter and every resource meter, present
/// and future
///
/// Nothing is registered anywhere if any meter rejects `views`.
pub fn register_resource_view(views: &[View]) -> Result<()> {
    let mut meters = METERS.write();
    meters.default.check_register(views)?;
    for meter in meters.by_resource.values() {
        meter.check_register(views)?;
    }

    meters.default.register(views)?;
    for meter in meters.by_resource.values() {
        meter.register(views)?;
    }
    for view in views {
        if !meters.resource_views.iter().any(|v| v.same_as(view)) {
            meters.resource_views.push(view.clone());
        }
    }
    Ok(())
}

/// Undo [`register_resource_view`]
pub fn unregister_resource_view(views: &[View]) {
    let mut meters = METERS.write();
    meters.default.unregister(views);
    for meter in meters.by_resource.values() {
        meter.unregister(views);
    }
    meters
        .resource_views
        .retain(|v| !views.iter().any(|view| view.name() == v.name()));
    meters.by_resource.retain(|_, meter| !meter.is_empty());
}

/// Replace the current metrics configuration
pub fn set_cur_metrics_config(config: Option<MetricsConfig>) {
    *CURRENT_CONFIG.write() = config;
}

pub fn cur_metrics_config() -> Option<MetricsConfig> {
    CURRENT_CONFIG.read().clone()
}

/// Record one measurement
pub fn record(ctx: &RecordContext, measurement: Measurement) {
    record_batch(ctx, &[measurement]);
}

/// Record several measurements sharing one context
pub fn record_batch(ctx: &RecordContext, measurements: &[Measurement]) {
    let recorder = CURRENT_CONFIG
        .read()
        .as_ref()
        .and_then(|config| config.recorder.clone());
    if let Some(recorder) = recorder {
        recorder(ctx, measurements);
        return;
    }

    let meter = match &ctx.resource {
        Some(resource) => match recording_meter(resource) {
            Some(meter) => meter,
            None => return,
        },
        None => default_meter(),
    };
    meter.record(&ctx.tags, measurements);
}

/// The meter a recording for `resource` lands in. No meter is created while
/// there are no resource views, since it would have nothing to aggregate.
fn recording_meter(resource: &MetricResource) -> Option<Arc<Meter>> {
    {
        let meters = METERS.read();
        if let Some(meter) = meters.by_resource.get(resource) {
            return Some(meter.clone());
        }
        if meters.resource_views.is_empty() {
            return None;
        }
    }
    Some(meter_for_resource(resource))
}
