use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Affinity, Lifecycle, Probe};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema, CustomResource)]
#[kube(
    group = "app.cloudclub.com",
    version = "v1alpha1",
    kind = "Application",
    root = "ApplicationCrd",
    status = "ApplicationStatus",
    shortname = "app",
    namespaced,
    printcolumn = r#"{
        "name": "image",
        "type": "string",
        "description": "container image",
        "jsonPath": ".spec.app.image"
    }"#,
    printcolumn = r#"{
        "name": "port",
        "type": "integer",
        "description": "container port",
        "jsonPath": ".spec.app.containerPort"
    }"#,
    printcolumn = r#"{
        "name": "replicas",
        "type": "integer",
        "description": "desired replicas",
        "jsonPath": ".spec.app.replicas"
    }"#,
    printcolumn = r#"{
        "name": "created-at",
        "type": "date",
        "description": "created time",
        "jsonPath": ".metadata.creationTimestamp"
    }"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub app: AppSpec,
    #[serde(default)]
    pub scheduler: SchedulerSpec,
    #[serde(default)]
    pub probe: ProbeSpec,
    #[serde(default)]
    pub termination_grace_period_seconds: Option<i64>,
    #[serde(default)]
    pub service: ServiceSpec,
    #[serde(default)]
    pub ingress: IngressSpec,
}

/// Reserved for observed conditions; never written by the operator yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    pub image: String,
    #[schemars(range(min = 1, max = 65535))]
    pub container_port: i32,
    /// Falls back to the resource name when empty.
    #[serde(default)]
    pub container_name: String,
    /// `None` leaves the replica count to the platform.
    #[serde(default)]
    pub replicas: Option<i32>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub app_type: Option<AppType>,
    #[serde(default)]
    pub life_cycle: Option<Lifecycle>,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum AppType {
    #[serde(rename = "back")]
    #[strum(serialize = "back")]
    Back,
    #[serde(rename = "front-spa")]
    #[strum(serialize = "front-spa")]
    FrontSpa,
    #[serde(rename = "front-ssr", alias = "front-srr")]
    #[strum(to_string = "front-ssr", serialize = "front-srr")]
    FrontSsr,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSpec {
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub affinity: Option<Affinity>,
    #[serde(default)]
    pub pod_disruption_budget: PodDisruptionBudgetSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionBudgetSpec {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub min_available: Option<i32>,
    #[serde(default)]
    pub max_unavailable: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    #[serde(default)]
    pub startup: Option<Probe>,
    #[serde(default)]
    pub liveness: Option<Probe>,
    #[serde(default)]
    pub readiness: Option<Probe>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ServiceSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: IngressRulesSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRulesSpec {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub paths: Vec<IngressPathSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressPathSpec {
    #[serde(default)]
    pub path: Option<String>,
    /// Accepted for manifest compatibility; routes always target the
    /// application's own service.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Accepted for manifest compatibility; routes always target
    /// `app.containerPort`.
    #[serde(default)]
    pub port: Option<i32>,
}
