#[cfg(test)]
pub(crate) mod fake;

use core::{fmt, future::Future, time::Duration};

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{api::PostParams, Api, Client, Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use strum::Display;
use tokio::time;
use tracing::{instrument, Level};

use crate::{
    error::{Error, Result},
    key::ObjectKey,
};

/// A namespaced object the cluster can store.
pub trait Object
where
    Self: 'static
        + Send
        + Sync
        + Clone
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
}

impl<T> Object for T where
    T: 'static
        + Send
        + Sync
        + Clone
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Resource<DynamicType = (), Scope = NamespaceResourceScope>
{
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Verb {
    Get,
    Create,
    Update,
}

/// Typed read/write access to the cluster API.
///
/// `update` must reject a stale `resourceVersion` with [`Error::Conflict`].
#[async_trait]
pub trait Cluster
where
    Self: Send + Sync,
{
    async fn get<K>(&self, key: &ObjectKey) -> Result<Option<K>>
    where
        K: Object;

    async fn create<K>(&self, object: &K) -> Result<()>
    where
        K: Object;

    async fn update<K>(&self, object: &K) -> Result<()>
    where
        K: Object;
}

pub(crate) fn kind_of<K>() -> String
where
    K: Resource<DynamicType = ()>,
{
    K::kind(&()).into_owned()
}

/// Records `owner` as the controlling owner of `child`.
pub fn set_owner_reference<O, K>(owner: &O, child: &mut K) -> Result<()>
where
    O: Resource<DynamicType = ()>,
    K: Resource,
{
    let owner_reference = owner
        .controller_owner_ref(&())
        .ok_or_else(|| Error::MissingMetadata {
            kind: kind_of::<O>(),
            name: owner.name_any(),
            field: "uid",
        })?;

    let owner_references = child.meta_mut().owner_references.get_or_insert_with(Vec::new);
    owner_references.retain(|reference| reference.uid != owner_reference.uid);
    owner_references.push(owner_reference);
    Ok(())
}

#[derive(Clone)]
pub struct KubeCluster {
    kube: Client,
    field_manager: String,
    timeout: Duration,
}

impl KubeCluster {
    pub fn new(kube: Client, field_manager: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kube,
            field_manager: field_manager.into(),
            timeout,
        }
    }

    fn api<K>(&self, key: &ObjectKey) -> Api<K>
    where
        K: Object,
    {
        Api::namespaced(self.kube.clone(), &key.namespace)
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    async fn call<K, T, Fut>(&self, verb: Verb, key: &ObjectKey, f: Fut) -> Result<T>
    where
        K: Object,
        Fut: Future<Output = Result<T, ::kube::Error>>,
    {
        bounded::<K, _, _>(self.timeout, verb, key, f).await
    }
}

/// Runs a single API call, giving up after `timeout`.
async fn bounded<K, T, Fut>(timeout: Duration, verb: Verb, key: &ObjectKey, f: Fut) -> Result<T>
where
    K: Object,
    Fut: Future<Output = Result<T, ::kube::Error>>,
{
    match time::timeout(timeout, f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(Error::from_kube(error, verb, kind_of::<K>(), key.clone())),
        Err(_) => Err(Error::Timeout {
            verb,
            kind: kind_of::<K>(),
            key: key.clone(),
            timeout,
        }),
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    #[instrument(level = Level::DEBUG, skip_all, fields(%key), err(Display))]
    async fn get<K>(&self, key: &ObjectKey) -> Result<Option<K>>
    where
        K: Object,
    {
        let api = self.api::<K>(key);
        self.call::<K, _, _>(Verb::Get, key, api.get_opt(&key.name))
            .await
    }

    #[instrument(level = Level::DEBUG, skip_all, err(Display))]
    async fn create<K>(&self, object: &K) -> Result<()>
    where
        K: Object,
    {
        let key = ObjectKey::of(object)?;
        let api = self.api::<K>(&key);
        let pp = self.post_params();
        self.call::<K, _, _>(Verb::Create, &key, api.create(&pp, object))
            .await
            .map(|_| ())
    }

    #[instrument(level = Level::DEBUG, skip_all, err(Display))]
    async fn update<K>(&self, object: &K) -> Result<()>
    where
        K: Object,
    {
        // `replace` carries `metadata.resourceVersion`, so a stale read fails with 409
        let key = ObjectKey::of(object)?;
        let api = self.api::<K>(&key);
        let pp = self.post_params();
        self.call::<K, _, _>(Verb::Update, &key, api.replace(&key.name, &pp, object))
            .await
            .map(|_| ())
    }
}
