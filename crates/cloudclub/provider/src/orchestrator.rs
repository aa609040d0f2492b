use core::fmt;

use tracing::{info, instrument, Level};

use crate::{
    child::{ChildKind, IngressRoute, NetworkService, Workload},
    cluster::Cluster,
    error::Result,
    key::ObjectKey,
    reader::DesiredStateReader,
    store::{Convergence, ConvergenceStore},
};

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Report {
    /// The application is gone; nothing was touched.
    Absent,
    /// Every planned child, in convergence order.
    Converged(Vec<(ChildKind, Convergence)>),
}

impl Report {
    pub fn is_in_sync(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Converged(children) => children
                .iter()
                .all(|(_, convergence)| *convergence == Convergence::InSync),
        }
    }

    /// Number of children created or updated.
    pub fn writes(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Converged(children) => children
                .iter()
                .filter(|(_, convergence)| convergence.is_write())
                .count(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Converged(children) => {
                for (index, (kind, convergence)) in children.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{kind}={convergence}")?;
                }
                Ok(())
            }
        }
    }
}

/// Drives one application and its children towards the declared state.
///
/// Children are converged in [`ChildKind::ORDER`]. The first failure aborts
/// the pass, leaving later children untouched until the next attempt.
pub struct Reconciler<'a, C> {
    cluster: &'a C,
}

impl<'a, C> Reconciler<'a, C>
where
    C: Cluster,
{
    pub const fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    #[instrument(level = Level::INFO, skip_all, fields(%key), err(Display))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Report> {
        let app = match DesiredStateReader::new(self.cluster).fetch(key).await? {
            Some(app) => app,
            None => return Ok(Report::Absent),
        };

        let store = ConvergenceStore::new(self.cluster);
        let mut children = Vec::with_capacity(ChildKind::ORDER.len());
        for kind in ChildKind::plan(&app.spec) {
            let convergence = match kind {
                ChildKind::Workload => store.converge::<Workload>(&app, key).await?,
                ChildKind::NetworkService => store.converge::<NetworkService>(&app, key).await?,
                ChildKind::IngressRoute => store.converge::<IngressRoute>(&app, key).await?,
            };
            children.push((kind, convergence));
        }

        let report = Report::Converged(children);
        if report.is_in_sync() {
            info!("application {key} is in sync");
        } else {
            info!("converged application {key}: {report}");
        }
        Ok(report)
    }
}
