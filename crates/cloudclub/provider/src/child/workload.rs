use cloudclub_api::application::{AppSpec, ApplicationSpec, ProbeSpec, SchedulerSpec};
use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Affinity, Container, ContainerPort, NodeAffinity, NodeSelector,
            NodeSelectorRequirement, NodeSelectorTerm, PodSpec, PodTemplateSpec,
        },
    },
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};
use kube::api::ObjectMeta;

use super::{ChildKind, ChildResource};
use crate::{
    diff::{app_labels, drifted, non_empty},
    key::ObjectKey,
};

pub struct Workload;

impl Workload {
    pub const PORT_NAME: &'static str = "http";

    /// Node label pinned by the fallback affinity.
    pub const DEFAULT_AFFINITY_KEY: &'static str = "kubernetes.io/os";
    pub const DEFAULT_AFFINITY_VALUE: &'static str = "linux";

    /// Stands in for a missing `scheduler.affinity` so that every workload
    /// carries an explicit constraint.
    pub fn default_affinity() -> Affinity {
        Affinity {
            node_affinity: Some(NodeAffinity {
                required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                    node_selector_terms: vec![NodeSelectorTerm {
                        match_expressions: Some(vec![NodeSelectorRequirement {
                            key: Self::DEFAULT_AFFINITY_KEY.into(),
                            operator: "In".into(),
                            values: Some(vec![Self::DEFAULT_AFFINITY_VALUE.into()]),
                        }]),
                        ..Default::default()
                    }],
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn container_name(app: &AppSpec, key: &ObjectKey) -> String {
        if app.container_name.is_empty() {
            key.name.clone()
        } else {
            app.container_name.clone()
        }
    }
}

/// Owned fields of a [`Deployment`] that drifted from the application.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkloadDelta {
    pub replicas: Option<i32>,
    pub affinity: Option<Affinity>,
}

impl ChildResource for Workload {
    type Object = Deployment;
    type Delta = WorkloadDelta;

    const KIND: ChildKind = ChildKind::Workload;

    fn synthesize(spec: &ApplicationSpec, key: &ObjectKey) -> Self::Object {
        let ApplicationSpec {
            app,
            scheduler:
                SchedulerSpec {
                    node_selector,
                    affinity,
                    pod_disruption_budget: _,
                },
            probe:
                ProbeSpec {
                    startup,
                    liveness,
                    readiness,
                },
            termination_grace_period_seconds,
            service: _,
            ingress: _,
        } = spec;

        let labels = app_labels(&key.name);

        Deployment {
            metadata: super::metadata(key, &Default::default()),
            spec: Some(DeploymentSpec {
                replicas: app.replicas,
                selector: LabelSelector {
                    match_expressions: None,
                    match_labels: Some(labels.clone()),
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        annotations: non_empty(&app.annotations),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        affinity: Some(affinity.clone().unwrap_or_else(Self::default_affinity)),
                        containers: vec![Container {
                            name: Self::container_name(app, key),
                            image: Some(app.image.clone()),
                            lifecycle: app.life_cycle.clone(),
                            liveness_probe: liveness.clone(),
                            ports: Some(vec![ContainerPort {
                                container_port: app.container_port,
                                name: Some(Self::PORT_NAME.into()),
                                protocol: Some("TCP".into()),
                                ..Default::default()
                            }]),
                            readiness_probe: readiness.clone(),
                            startup_probe: startup.clone(),
                            ..Default::default()
                        }],
                        node_selector: non_empty(node_selector),
                        termination_grace_period_seconds: *termination_grace_period_seconds,
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }

    fn diff(desired: &Self::Object, observed: &Self::Object) -> Option<Self::Delta> {
        let delta = WorkloadDelta {
            replicas: drifted(replicas(desired), replicas(observed)),
            affinity: drifted(affinity(desired), affinity(observed)),
        };

        if delta.replicas.is_none() && delta.affinity.is_none() {
            None
        } else {
            Some(delta)
        }
    }

    fn apply(observed: &mut Self::Object, delta: Self::Delta) {
        let WorkloadDelta {
            replicas,
            affinity,
        } = delta;

        let spec = observed.spec.get_or_insert_with(Default::default);
        if let Some(replicas) = replicas {
            spec.replicas = Some(replicas);
        }
        if let Some(affinity) = affinity {
            spec.template
                .spec
                .get_or_insert_with(Default::default)
                .affinity = Some(affinity);
        }
    }
}

fn replicas(deployment: &Deployment) -> Option<&i32> {
    deployment.spec.as_ref()?.replicas.as_ref()
}

fn affinity(deployment: &Deployment) -> Option<&Affinity> {
    deployment
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .affinity
        .as_ref()
}
