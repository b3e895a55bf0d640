//! Handler metrics

use std::time::Duration;

use kduck_metrics::{
    Aggregation, Float64Measure, RecordContext, Tags, UNIT_MILLISECONDS, View, buckets_125,
};
use once_cell::sync::Lazy;

use crate::error::Result;
use crate::review::split_api_version;

pub const HANDLER_DURATION: &str = "kduck.webhook.handler.duration";

pub const WEBHOOK_TYPE_ATTR: &str = "kduck.webhook.type";
pub const GROUP_ATTR: &str = "kduck.webhook.resource.group";
pub const VERSION_ATTR: &str = "kduck.webhook.resource.version";
pub const STATUS_ATTR: &str = "kduck.webhook.status";

pub const WEBHOOK_TYPE_CONVERSION: &str = "conversion";

static HANDLER_DURATION_MEASURE: Lazy<Float64Measure> = Lazy::new(|| {
    Float64Measure::new(
        HANDLER_DURATION,
        "The duration of task execution",
        UNIT_MILLISECONDS,
    )
});

fn handler_duration_view() -> View {
    View::new(
        HANDLER_DURATION_MEASURE.measure(),
        Aggregation::Distribution(buckets_125(1.0, 100_000.0)),
    )
    .with_tag_keys([WEBHOOK_TYPE_ATTR, GROUP_ATTR, VERSION_ATTR, STATUS_ATTR])
}

/// Register the handler views. Safe to call more than once.
pub fn register_views() -> Result<()> {
    kduck_metrics::register_resource_view(&[handler_duration_view()])?;
    Ok(())
}

/// Record how long a conversion took, attributed to the desired version
pub(crate) fn record_conversion(desired_api_version: &str, status: &str, elapsed: Duration) {
    let (group, version) = split_api_version(desired_api_version);
    let tags = Tags::new()
        .with(WEBHOOK_TYPE_ATTR, WEBHOOK_TYPE_CONVERSION)
        .with(GROUP_ATTR, group)
        .with(VERSION_ATTR, version)
        .with(STATUS_ATTR, status);
    kduck_metrics::record(
        &RecordContext::new().with_tags(tags),
        HANDLER_DURATION_MEASURE.m(elapsed.as_secs_f64() * 1000.0),
    );
}
