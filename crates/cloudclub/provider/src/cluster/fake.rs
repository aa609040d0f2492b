//! In-memory [`Cluster`] used by the unit tests.

use core::time::Duration;
use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use cloudclub_api::application::{AppSpec, ApplicationCrd, ApplicationSpec};
use serde_json::Value;

use super::{kind_of, Cluster, Object, Verb};
use crate::{
    error::{Error, Result},
    key::ObjectKey,
};

pub(crate) const NAMESPACE: &str = "shop";

pub(crate) fn sample_spec() -> ApplicationSpec {
    ApplicationSpec {
        app: AppSpec {
            image: "nginx:1.27".into(),
            container_port: 8080,
            container_name: String::default(),
            replicas: Some(3),
            annotations: Default::default(),
            app_type: None,
            life_cycle: None,
        },
        scheduler: Default::default(),
        probe: Default::default(),
        termination_grace_period_seconds: None,
        service: Default::default(),
        ingress: Default::default(),
    }
}

pub(crate) fn application(name: &str, spec: ApplicationSpec) -> ApplicationCrd {
    let mut app = ApplicationCrd::new(name, spec);
    app.metadata.namespace = Some(NAMESPACE.into());
    app
}

/// Gives `object` the server-side fields a real API server would fill in.
pub(crate) fn stamped<K>(mut object: K) -> K
where
    K: Object,
{
    let meta = object.meta_mut();
    meta.uid.get_or_insert_with(|| "uid-0".into());
    meta.resource_version.get_or_insert_with(|| "0".into());
    object
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Call {
    pub(crate) verb: Verb,
    pub(crate) kind: String,
    pub(crate) key: ObjectKey,
}

#[derive(Clone, Debug)]
pub(crate) enum Fault {
    Timeout,
    Conflict,
    NotFound,
    /// Another writer creates this object right before our create lands.
    Preempt(Value),
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, ObjectKey), Value>,
    revision: u64,
    calls: Vec<Call>,
    faults: Vec<(Verb, String, Fault)>,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }

    fn store<K>(&mut self, key: ObjectKey, mut object: K) -> K
    where
        K: Object,
    {
        let revision = self.next_revision();
        let meta = object.meta_mut();
        meta.uid.get_or_insert_with(|| format!("uid-{revision}"));
        meta.resource_version = Some(revision);

        let value = ::serde_json::to_value(&object).expect("failed to serialize object");
        self.objects.insert((kind_of::<K>(), key), value);
        object
    }

    fn load<K>(&self, key: &ObjectKey) -> Option<K>
    where
        K: Object,
    {
        self.objects
            .get(&(kind_of::<K>(), key.clone()))
            .cloned()
            .map(|value| ::serde_json::from_value(value).expect("failed to deserialize object"))
    }

    fn take_fault<K>(&mut self, verb: Verb) -> Option<Fault>
    where
        K: Object,
    {
        let kind = kind_of::<K>();
        let index = self
            .faults
            .iter()
            .position(|(v, k, _)| *v == verb && *k == kind)?;
        Some(self.faults.remove(index).2)
    }

    fn record<K>(&mut self, verb: Verb, key: &ObjectKey) -> Result<()>
    where
        K: Object,
    {
        let kind = kind_of::<K>();
        self.calls.push(Call {
            verb,
            kind: kind.clone(),
            key: key.clone(),
        });

        match self.take_fault::<K>(verb) {
            None => Ok(()),
            Some(Fault::Timeout) => Err(Error::Timeout {
                verb,
                kind,
                key: key.clone(),
                timeout: Duration::from_secs(10),
            }),
            Some(Fault::Conflict) => Err(Error::Conflict {
                kind,
                key: key.clone(),
            }),
            Some(Fault::NotFound) => Err(Error::NotFound {
                kind,
                key: key.clone(),
            }),
            Some(Fault::Preempt(value)) => {
                let object: K =
                    ::serde_json::from_value(value).expect("failed to deserialize object");
                self.store(key.clone(), object);
                Err(Error::AlreadyExists {
                    kind,
                    key: key.clone(),
                })
            }
        }
    }
}

impl FakeCluster {
    fn state(&self) -> ::std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake cluster is poisoned")
    }

    /// Seeds an object as if another actor had created it.
    pub(crate) fn insert<K>(&self, object: K) -> K
    where
        K: Object,
    {
        let key = ObjectKey::of(&object).expect("object key");
        self.state().store(key, object)
    }

    pub(crate) fn fetch<K>(&self, key: &ObjectKey) -> Option<K>
    where
        K: Object,
    {
        self.state().load(key)
    }

    /// Mutates a stored object as another actor would, bumping its revision.
    pub(crate) fn modify<K>(&self, key: &ObjectKey, f: impl FnOnce(&mut K))
    where
        K: Object,
    {
        let mut state = self.state();
        let mut object: K = state.load(key).expect("no such object");
        f(&mut object);
        state.store(key.clone(), object);
    }

    pub(crate) fn remove<K>(&self, key: &ObjectKey)
    where
        K: Object,
    {
        self.state().objects.remove(&(kind_of::<K>(), key.clone()));
    }

    /// Fails the next `verb` on `K` with `fault`.
    pub(crate) fn inject<K>(&self, verb: Verb, fault: Fault)
    where
        K: Object,
    {
        self.state().faults.push((verb, kind_of::<K>(), fault));
    }

    pub(crate) fn preempt_create<K>(&self, object: K)
    where
        K: Object,
    {
        let value = ::serde_json::to_value(&object).expect("failed to serialize object");
        self.inject::<K>(Verb::Create, Fault::Preempt(value));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn calls_for<K>(&self) -> Vec<Call>
    where
        K: Object,
    {
        let kind = kind_of::<K>();
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .collect()
    }

    pub(crate) fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.verb != Verb::Get)
            .collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn get<K>(&self, key: &ObjectKey) -> Result<Option<K>>
    where
        K: Object,
    {
        let mut state = self.state();
        state.record::<K>(Verb::Get, key)?;
        Ok(state.load(key))
    }

    async fn create<K>(&self, object: &K) -> Result<()>
    where
        K: Object,
    {
        let key = ObjectKey::of(object)?;
        let mut state = self.state();
        state.record::<K>(Verb::Create, &key)?;

        if state.load::<K>(&key).is_some() {
            return Err(Error::AlreadyExists {
                kind: kind_of::<K>(),
                key,
            });
        }
        state.store(key, object.clone());
        Ok(())
    }

    async fn update<K>(&self, object: &K) -> Result<()>
    where
        K: Object,
    {
        let key = ObjectKey::of(object)?;
        let mut state = self.state();
        state.record::<K>(Verb::Update, &key)?;

        let stored = state.load::<K>(&key).ok_or_else(|| Error::NotFound {
            kind: kind_of::<K>(),
            key: key.clone(),
        })?;
        if stored.meta().resource_version != object.meta().resource_version {
            return Err(Error::Conflict {
                kind: kind_of::<K>(),
                key,
            });
        }
        state.store(key, object.clone());
        Ok(())
    }
}
