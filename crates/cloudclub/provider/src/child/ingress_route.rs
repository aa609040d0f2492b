use cloudclub_api::application::{ApplicationSpec, IngressPathSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};

use super::{ChildKind, ChildResource};
use crate::{diff::drifted, key::ObjectKey};

pub struct IngressRoute;

impl IngressRoute {
    pub const DEFAULT_PATH: &'static str = "/";
    pub const PATH_TYPE: &'static str = "Prefix";

    fn path(path: &str, key: &ObjectKey, port: i32) -> HTTPIngressPath {
        HTTPIngressPath {
            backend: IngressBackend {
                resource: None,
                service: Some(IngressServiceBackend {
                    name: key.name.clone(),
                    port: Some(ServiceBackendPort {
                        name: None,
                        number: Some(port),
                    }),
                }),
            },
            path: Some(path.into()),
            path_type: Self::PATH_TYPE.into(),
        }
    }

    fn rules(spec: &ApplicationSpec, key: &ObjectKey) -> Vec<IngressRule> {
        let rules = &spec.ingress.rules;
        let port = spec.app.container_port;

        let mut paths: Vec<_> = rules
            .paths
            .iter()
            .map(|IngressPathSpec { path, .. }| {
                let path = path
                    .as_deref()
                    .filter(|path| !path.is_empty())
                    .unwrap_or(Self::DEFAULT_PATH);
                Self::path(path, key, port)
            })
            .collect();
        if paths.is_empty() {
            paths.push(Self::path(Self::DEFAULT_PATH, key, port));
        }

        vec![IngressRule {
            host: Some(rules.host.clone()).filter(|host| !host.is_empty()),
            http: Some(HTTPIngressRuleValue { paths }),
        }]
    }
}

/// The full rule set of an [`Ingress`], replaced as a whole.
#[derive(Clone, Debug, PartialEq)]
pub struct IngressRouteDelta {
    pub rules: Vec<IngressRule>,
}

impl ChildResource for IngressRoute {
    type Object = Ingress;
    type Delta = IngressRouteDelta;

    const KIND: ChildKind = ChildKind::IngressRoute;

    fn synthesize(spec: &ApplicationSpec, key: &ObjectKey) -> Self::Object {
        Ingress {
            metadata: super::metadata(key, &spec.ingress.annotations),
            spec: Some(IngressSpec {
                rules: Some(Self::rules(spec, key)),
                ..Default::default()
            }),
            status: None,
        }
    }

    fn diff(desired: &Self::Object, observed: &Self::Object) -> Option<Self::Delta> {
        drifted(rules(desired), rules(observed)).map(|rules| IngressRouteDelta { rules })
    }

    fn apply(observed: &mut Self::Object, delta: Self::Delta) {
        let IngressRouteDelta { rules } = delta;
        observed.spec.get_or_insert_with(Default::default).rules = Some(rules);
    }
}

fn rules(ingress: &Ingress) -> Option<&Vec<IngressRule>> {
    ingress.spec.as_ref()?.rules.as_ref()
}
