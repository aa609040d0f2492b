pub mod ingress_route;
pub mod network_service;
pub mod workload;

use core::fmt;
use std::collections::BTreeMap;

use cloudclub_api::application::ApplicationSpec;
use kube::api::ObjectMeta;
use strum::Display;

pub use self::{
    ingress_route::IngressRoute, network_service::NetworkService, workload::Workload,
};
use crate::{cluster::Object, key::ObjectKey};

/// A kind of object derived from an application.
///
/// `synthesize` is pure. `diff` only looks at the fields the operator owns,
/// and `apply` only writes those fields back onto the observed object.
pub trait ChildResource {
    type Object: Object;
    type Delta: fmt::Debug + Send;

    const KIND: ChildKind;

    fn synthesize(spec: &ApplicationSpec, key: &ObjectKey) -> Self::Object;

    fn diff(desired: &Self::Object, observed: &Self::Object) -> Option<Self::Delta>;

    fn apply(observed: &mut Self::Object, delta: Self::Delta);
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum ChildKind {
    Workload,
    NetworkService,
    IngressRoute,
}

impl ChildKind {
    /// Convergence order within a single pass.
    pub const ORDER: [Self; 3] = [Self::Workload, Self::NetworkService, Self::IngressRoute];

    pub fn is_enabled(self, spec: &ApplicationSpec) -> bool {
        match self {
            Self::Workload => true,
            Self::NetworkService => spec.service.is_enabled(),
            Self::IngressRoute => spec.ingress.enabled,
        }
    }

    pub fn plan(spec: &ApplicationSpec) -> impl Iterator<Item = Self> + '_ {
        Self::ORDER
            .into_iter()
            .filter(move |kind| kind.is_enabled(spec))
    }
}

fn metadata(key: &ObjectKey, annotations: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(key.name.clone()),
        namespace: Some(key.namespace.clone()),
        labels: Some(crate::diff::app_labels(&key.name)),
        annotations: crate::diff::non_empty(annotations),
        ..Default::default()
    }
}
