use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use cloudclub_api::application::ApplicationCrd;
use cloudclub_core::env;
use cloudclub_core_k8s::manager::{Manager, TryDefault};
use cloudclub_provider::{Error, KubeCluster, ObjectKey, Reconciler, Report};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use tracing::{info, instrument, warn, Level};

use crate::consts;

pub struct Ctx {
    api_timeout: Duration,
    field_manager: String,
}

impl Ctx {
    const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);
}

#[async_trait]
impl TryDefault for Ctx {
    async fn try_default() -> Result<Self> {
        let api_timeout = env::infer_or(
            consts::ENV_API_TIMEOUT_SECS,
            Self::DEFAULT_API_TIMEOUT.as_secs(),
        );

        Ok(Self {
            api_timeout: Duration::from_secs(api_timeout),
            field_manager: env::infer_string(consts::ENV_FIELD_MANAGER)
                .unwrap_or_else(|_| consts::NAME.into()),
        })
    }
}

#[async_trait]
impl ::cloudclub_core_k8s::manager::Ctx for Ctx {
    type Data = ApplicationCrd;
    type Error = Error;

    const NAME: &'static str = crate::consts::NAME;
    const FALLBACK: Duration = Duration::from_secs(5 * 60); // 5 minutes

    fn owns(
        controller: Controller<<Self as ::cloudclub_core_k8s::manager::Ctx>::Data>,
        kube: &Client,
    ) -> Controller<<Self as ::cloudclub_core_k8s::manager::Ctx>::Data> {
        controller
            .owns(Api::<Deployment>::all(kube.clone()), Config::default())
            .owns(Api::<Service>::all(kube.clone()), Config::default())
            .owns(Api::<Ingress>::all(kube.clone()), Config::default())
    }

    #[instrument(level = Level::INFO, skip_all, fields(name = %data.name_any(), namespace = data.namespace()), err(Display))]
    async fn reconcile(
        manager: Arc<Manager<Self>>,
        data: Arc<<Self as ::cloudclub_core_k8s::manager::Ctx>::Data>,
    ) -> Result<Action, Error>
    where
        Self: Sized,
    {
        let key = ObjectKey::of(&*data)?;
        let cluster = KubeCluster::new(
            manager.kube.clone(),
            manager.ctx.field_manager.clone(),
            manager.ctx.api_timeout,
        );

        match Reconciler::new(&cluster).reconcile(&key).await? {
            Report::Absent => {
                info!("application {key} is gone; skipping");
                Ok(Action::await_change())
            }
            report => {
                if report.writes() > 0 {
                    info!("reconciled application {key}: {report}");
                }
                Ok(Action::requeue(
                    <Self as ::cloudclub_core_k8s::manager::Ctx>::FALLBACK,
                ))
            }
        }
    }

    fn error_policy(_manager: Arc<Manager<Self>>, error: &Error) -> Action
    where
        Self: Sized,
    {
        if error.is_transient() {
            Action::requeue(<Self as ::cloudclub_core_k8s::manager::Ctx>::RETRY)
        } else {
            warn!("not retrying until the application changes: {error}");
            Action::await_change()
        }
    }
}
