use cloudclub_api::application::ApplicationCrd;
use strum::Display;
use tracing::{debug, info, instrument, Level};

use crate::{
    child::ChildResource,
    cluster::{kind_of, set_owner_reference, Cluster},
    error::{Error, Result},
    key::ObjectKey,
};

/// What a single convergence step did to the cluster.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum Convergence {
    Created,
    Updated,
    InSync,
}

impl Convergence {
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Makes one child of an application match its synthesized form.
///
/// At most one write is issued per call. A missing child is created with
/// the owner linked; an existing child is only updated when one of the
/// fields the operator owns has drifted.
pub struct ConvergenceStore<'a, C> {
    cluster: &'a C,
}

impl<'a, C> ConvergenceStore<'a, C>
where
    C: Cluster,
{
    pub const fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    #[instrument(
        level = Level::INFO,
        skip_all,
        fields(kind = %R::KIND, %key),
        err(Display),
    )]
    pub async fn converge<R>(&self, owner: &ApplicationCrd, key: &ObjectKey) -> Result<Convergence>
    where
        R: ChildResource,
    {
        let desired = R::synthesize(&owner.spec, key);

        let observed = match self.cluster.get::<R::Object>(key).await? {
            Some(observed) => observed,
            None => match self.create::<R>(owner, key, &desired).await? {
                Some(convergence) => return Ok(convergence),
                // lost a create race; converge against the winner
                None => self.reread::<R>(key).await?,
            },
        };

        self.update::<R>(key, &desired, observed).await
    }

    /// Returns `None` if someone else created the object first.
    async fn create<R>(
        &self,
        owner: &ApplicationCrd,
        key: &ObjectKey,
        desired: &R::Object,
    ) -> Result<Option<Convergence>>
    where
        R: ChildResource,
    {
        let mut object = desired.clone();
        set_owner_reference(owner, &mut object)?;

        match self.cluster.create(&object).await {
            Ok(()) => {
                info!("created {kind} {key}", kind = R::KIND);
                Ok(Some(Convergence::Created))
            }
            Err(Error::AlreadyExists { .. }) => {
                debug!("{kind} {key} was created concurrently", kind = R::KIND);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn reread<R>(&self, key: &ObjectKey) -> Result<R::Object>
    where
        R: ChildResource,
    {
        self.cluster
            .get::<R::Object>(key)
            .await?
            .ok_or_else(|| Error::Vanished {
                kind: kind_of::<R::Object>(),
                key: key.clone(),
            })
    }

    async fn update<R>(
        &self,
        key: &ObjectKey,
        desired: &R::Object,
        mut observed: R::Object,
    ) -> Result<Convergence>
    where
        R: ChildResource,
    {
        let delta = match R::diff(desired, &observed) {
            Some(delta) => delta,
            None => {
                debug!("{kind} {key} is in sync", kind = R::KIND);
                return Ok(Convergence::InSync);
            }
        };

        debug!("{kind} {key} drifted: {delta:?}", kind = R::KIND);
        R::apply(&mut observed, delta);

        match self.cluster.update(&observed).await {
            Ok(()) => {
                info!("updated {kind} {key}", kind = R::KIND);
                Ok(Convergence::Updated)
            }
            Err(Error::NotFound { kind, key }) => Err(Error::Vanished { kind, key }),
            Err(error) => Err(error),
        }
    }
}
