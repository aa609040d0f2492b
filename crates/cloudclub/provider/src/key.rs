use core::fmt;

use kube::Resource;

use crate::error::{Error, Result};

/// Identity shared by an application and every child it owns.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn of<K>(object: &K) -> Result<Self>
    where
        K: Resource<DynamicType = ()>,
    {
        let meta = object.meta();
        let name = meta.name.clone().ok_or_else(|| Error::MissingMetadata {
            kind: K::kind(&()).into_owned(),
            name: String::default(),
            field: "name",
        })?;
        let namespace = meta
            .namespace
            .clone()
            .ok_or_else(|| Error::MissingMetadata {
                kind: K::kind(&()).into_owned(),
                name: name.clone(),
                field: "namespace",
            })?;

        Ok(Self { namespace, name })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { namespace, name } = self;
        write!(f, "{namespace}/{name}")
    }
}
