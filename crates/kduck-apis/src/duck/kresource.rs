use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Duck, Status};

/// Any resource carrying the common `status` block (conditions and
/// observed generation). Used to track readiness of arbitrary kinds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KResource {
    pub metadata: ObjectMeta,
    pub status: Status,
}

impl KResource {
    /// Whether the controller has observed the latest spec
    pub fn is_observed(&self) -> bool {
        self.metadata
            .generation
            .is_none_or(|generation| self.status.observed_generation >= generation)
    }
}

impl Duck for KResource {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
