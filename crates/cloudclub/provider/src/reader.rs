use cloudclub_api::application::ApplicationCrd;
use tracing::{debug, instrument, Level};

use crate::{cluster::Cluster, error::Result, key::ObjectKey};

/// Loads the declared [`ApplicationCrd`] that a reconciliation starts from.
pub struct DesiredStateReader<'a, C> {
    cluster: &'a C,
}

impl<'a, C> DesiredStateReader<'a, C>
where
    C: Cluster,
{
    pub const fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    /// Returns `None` once the application has been deleted.
    #[instrument(level = Level::DEBUG, skip_all, fields(%key), err(Display))]
    pub async fn fetch(&self, key: &ObjectKey) -> Result<Option<ApplicationCrd>> {
        let app = self.cluster.get::<ApplicationCrd>(key).await?;
        if app.is_none() {
            debug!("application {key} is absent");
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::{
            fake::{self, FakeCluster, Fault},
            Verb,
        },
        error::Error,
    };

    fn key() -> ObjectKey {
        ObjectKey::new(fake::NAMESPACE, "web")
    }

    #[tokio::test]
    async fn fetch_existing_application() {
        let cluster = FakeCluster::default();
        cluster.insert(fake::application("web", fake::sample_spec()));

        let app = DesiredStateReader::new(&cluster)
            .fetch(&key())
            .await
            .expect("fetch");
        let app = app.expect("application");
        assert_eq!(app.spec.app.image, "nginx:1.27");
        assert!(app.metadata.uid.is_some());
    }

    #[tokio::test]
    async fn fetch_absent_application() {
        let cluster = FakeCluster::default();

        let app = DesiredStateReader::new(&cluster).fetch(&key()).await;
        assert!(matches!(app, Ok(None)));
    }

    #[tokio::test]
    async fn fetch_propagates_timeout() {
        let cluster = FakeCluster::default();
        cluster.inject::<ApplicationCrd>(Verb::Get, Fault::Timeout);

        let app = DesiredStateReader::new(&cluster).fetch(&key()).await;
        assert!(matches!(app, Err(Error::Timeout { verb: Verb::Get, .. })));
    }
}
