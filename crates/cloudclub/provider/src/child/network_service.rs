use cloudclub_api::application::ApplicationSpec;
use k8s_openapi::{
    api::core::v1::{Service, ServicePort, ServiceSpec},
    apimachinery::pkg::util::intstr::IntOrString,
};

use super::{ChildKind, ChildResource};
use crate::{
    diff::{app_labels, drifted},
    key::ObjectKey,
};

pub struct NetworkService;

impl NetworkService {
    pub const PORT_NAME: &'static str = "http";
    pub const TYPE: &'static str = "ClusterIP";

    fn port(port: i32) -> ServicePort {
        ServicePort {
            name: Some(Self::PORT_NAME.into()),
            port,
            protocol: Some("TCP".into()),
            target_port: Some(IntOrString::Int(port)),
            ..Default::default()
        }
    }
}

/// The `http` port pair of a [`Service`] that drifted from `containerPort`.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkServiceDelta {
    pub port: i32,
    pub target_port: IntOrString,
}

impl ChildResource for NetworkService {
    type Object = Service;
    type Delta = NetworkServiceDelta;

    const KIND: ChildKind = ChildKind::NetworkService;

    fn synthesize(spec: &ApplicationSpec, key: &ObjectKey) -> Self::Object {
        Service {
            metadata: super::metadata(key, &spec.service.annotations),
            spec: Some(ServiceSpec {
                ports: Some(vec![Self::port(spec.app.container_port)]),
                selector: Some(app_labels(&key.name)),
                type_: Some(Self::TYPE.into()),
                ..Default::default()
            }),
            status: None,
        }
    }

    fn diff(desired: &Self::Object, observed: &Self::Object) -> Option<Self::Delta> {
        let desired = http_port(desired).map(|port| (port.port, port.target_port.clone()));
        let observed = http_port(observed).map(|port| (port.port, port.target_port.clone()));

        drifted(desired.as_ref(), observed.as_ref()).map(|(port, target_port)| {
            NetworkServiceDelta {
                port,
                target_port: target_port.unwrap_or(IntOrString::Int(port)),
            }
        })
    }

    fn apply(observed: &mut Self::Object, delta: Self::Delta) {
        let NetworkServiceDelta { port, target_port } = delta;

        let ports = observed
            .spec
            .get_or_insert_with(Default::default)
            .ports
            .get_or_insert_with(Default::default);

        match http_port_index(ports) {
            Some(index) => {
                let observed = &mut ports[index];
                observed.port = port;
                observed.target_port = Some(target_port);
            }
            None => ports.push(ServicePort {
                target_port: Some(target_port),
                ..NetworkService::port(port)
            }),
        }
    }
}

/// The port named `http`, or the only port of a single-port service.
fn http_port(service: &Service) -> Option<&ServicePort> {
    let ports = service.spec.as_ref()?.ports.as_ref()?;
    http_port_index(ports).map(|index| &ports[index])
}

fn http_port_index(ports: &[ServicePort]) -> Option<usize> {
    ports
        .iter()
        .position(|port| port.name.as_deref() == Some(NetworkService::PORT_NAME))
        .or_else(|| (ports.len() == 1).then_some(0))
}
