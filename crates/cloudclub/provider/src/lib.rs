pub mod child;
pub mod cluster;
mod diff;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod reader;
pub mod store;

pub use self::{
    cluster::{Cluster, KubeCluster},
    error::{Error, Result},
    key::ObjectKey,
    orchestrator::{Reconciler, Report},
};
