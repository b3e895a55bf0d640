//! kduck Metrics - measurement recording for Kubernetes controllers
//!
//! This crate provides:
//! - **Measures**: Typed int64/float64 quantities and their measurements
//! - **Views**: Count, sum, last-value and distribution aggregations broken down by tags
//! - **Meters**: A default meter plus one meter per monitored resource
//! - **Recording**: `record`/`record_batch` with a pluggable recorder, forwarded to the `metrics` facade
//! - **Buckets**: Helpers for distribution bounds
//! - **Configuration**: Observability ConfigMap parsing

pub mod buckets;
pub mod config;
pub mod error;
pub mod measure;
pub mod meter;
pub mod record;
pub mod tags;
pub mod view;

pub use buckets::{buckets_125, buckets_n_by_10};
pub use config::{MetricsBackend, ObservabilityConfig};
pub use error::{MetricsError, Result};
pub use measure::{
    Float64Measure, Int64Measure, Measure, MeasureKind, Measurement, UNIT_BYTES,
    UNIT_DIMENSIONLESS, UNIT_MILLISECONDS, UNIT_SECONDS,
};
pub use meter::Meter;
pub use record::{
    MetricsConfig, Recorder, cur_metrics_config, default_meter, meter_for_resource, record,
    record_batch, register_resource_view, set_cur_metrics_config, unregister_resource_view,
};
pub use tags::{MetricResource, RecordContext, Tags};
pub use view::{Aggregation, AggregationData, DistributionData, Row, View};
