use core::{fmt, future::Future, time::Duration};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cloudclub_core::tracer;
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{Patch, PatchParams, PostParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, CustomResourceExt, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub struct Manager<C> {
    pub kube: Client,
    pub ctx: Arc<C>,
}

#[async_trait]
pub trait Ctx
where
    Self: 'static + Send + Sync + TryDefault,
    <Self as Ctx>::Data:
        Send + Sync + Clone + fmt::Debug + DeserializeOwned + Resource<DynamicType = ()>,
    <<Self as Ctx>::Data as Resource>::DynamicType:
        Clone + fmt::Debug + Default + Eq + Unpin + ::core::hash::Hash,
{
    type Data;
    type Error: 'static + Send + Sync + ::std::error::Error;

    const NAME: &'static str;
    /// Periodic resync after a successful pass.
    const FALLBACK: Duration = Duration::from_secs(30 * 60); // 30 minutes
    /// Requeue delay after a failed pass.
    const RETRY: Duration = Duration::from_secs(10);

    async fn spawn_crd()
    where
        Self: Sized,
        <Self as Ctx>::Data: CustomResourceExt,
    {
        <Self as Ctx>::try_spawn(|client| async move {
            Self::init_crd(client.clone())
                .await
                .map(|()| Self::init_resource(client))
        })
        .await
        .expect("spawning a manager with CRD")
    }

    async fn try_spawn<F, Fut>(f_init: F) -> Result<()>
    where
        Self: Sized,
        F: FnOnce(Client) -> Fut + Send,
        Fut: Future<Output = Result<Api<<Self as Ctx>::Data>>> + Send,
    {
        tracer::init_once();

        let client = Client::try_default().await?;
        let ctx = Arc::new(Self::try_default().await?);
        let manager = Arc::new(Manager {
            kube: client.clone(),
            ctx: ctx.clone(),
        });

        let api = f_init(client.clone()).await?;
        let kind = <<Self as Ctx>::Data>::kind(&());

        // All good. Start controller and return its future.
        let controller = Controller::new(api, Config::default());
        Self::owns(controller, &client)
            .shutdown_on_signal()
            .run(
                |data, manager| Self::reconcile(manager, data),
                |data, error, manager| {
                    let name = data.name_any();
                    let namespace = data.namespace().unwrap_or_default();
                    warn!("failed to reconcile {kind} ({namespace}/{name}): {error}");
                    Self::error_policy(manager, error)
                },
                manager,
            )
            .for_each(|result| {
                if let Err(error) = result {
                    debug!("controller event for {kind} dropped: {error}");
                }
                ::futures::future::ready(())
            })
            .await;

        info!("stopped controller: {kind}");
        tracer::shutdown();
        Ok(())
    }

    /// Registers the child kinds whose changes should re-enqueue their owner.
    fn owns(
        controller: Controller<<Self as Ctx>::Data>,
        _kube: &Client,
    ) -> Controller<<Self as Ctx>::Data> {
        controller
    }

    fn init_resource(client: Client) -> Api<<Self as Ctx>::Data> {
        Api::<<Self as Ctx>::Data>::all(client)
    }

    async fn init_crd(client: Client) -> Result<()>
    where
        <Self as Ctx>::Data: CustomResourceExt,
    {
        // Ensure CRD is installed before loop-watching
        let api = Api::<CustomResourceDefinition>::all(client);
        let crd = <Self as Ctx>::Data::crd();
        let name = crd.name_any();

        if api.get_opt(&name).await?.is_none() {
            let pp = PostParams {
                dry_run: false,
                field_manager: Some(<Self as Ctx>::NAME.into()),
            };
            api.create(&pp, &crd).await?;

            info!("Created CRD: {name}");
        } else {
            let pp = PatchParams::apply(<Self as Ctx>::NAME).force();
            api.patch(&name, &pp, &Patch::Apply(&crd)).await?;

            info!("Updated CRD: {name}");
        }
        Ok(())
    }

    async fn reconcile(
        manager: Arc<Manager<Self>>,
        data: Arc<<Self as Ctx>::Data>,
    ) -> Result<Action, <Self as Ctx>::Error>
    where
        Self: Sized;

    fn error_policy(_manager: Arc<Manager<Self>>, _error: &<Self as Ctx>::Error) -> Action
    where
        Self: Sized,
    {
        Action::requeue(<Self as Ctx>::RETRY)
    }
}

#[async_trait]
pub trait TryDefault {
    async fn try_default() -> Result<Self>
    where
        Self: Sized;
}
