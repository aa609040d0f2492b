use std::collections::BTreeMap;

use cloudclub_api::consts::LABEL_APP;
use maplit::btreemap;

/// Returns the desired value when it is set and differs from the observed one.
///
/// An unset desired value never drifts: the field is left to whoever else
/// manages it.
pub(crate) fn drifted<T>(desired: Option<&T>, observed: Option<&T>) -> Option<T>
where
    T: Clone + PartialEq,
{
    match desired {
        Some(desired) if observed != Some(desired) => Some(desired.clone()),
        Some(_) | None => None,
    }
}

pub(crate) fn app_labels(name: &str) -> BTreeMap<String, String> {
    btreemap! {
        LABEL_APP.into() => name.into(),
    }
}

pub(crate) fn non_empty<K, V>(map: &BTreeMap<K, V>) -> Option<BTreeMap<K, V>>
where
    K: Clone + Ord,
    V: Clone,
{
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}
