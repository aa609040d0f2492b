use core::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use tracing::warn;

pub fn infer<K, R>(key: K) -> Result<R>
where
    K: AsRef<str>,
    R: FromStr,
    <R as FromStr>::Err: 'static + Send + Sync + fmt::Display,
{
    let key = key.as_ref();

    infer_string(key).and_then(|e| {
        e.parse()
            .map_err(|error| anyhow!("failed to parse the environment variable ({key}): {error}"))
    })
}

/// Like [`infer`], but an unset variable silently yields `default`
/// and a malformed one yields `default` with a warning.
pub fn infer_or<K, R>(key: K, default: R) -> R
where
    K: AsRef<str>,
    R: FromStr + fmt::Debug,
    <R as FromStr>::Err: 'static + Send + Sync + fmt::Display,
{
    let key = key.as_ref();
    if ::std::env::var_os(key).is_none() {
        return default;
    }

    match infer(key) {
        Ok(value) => value,
        Err(error) => {
            warn!("{error}; falling back to {default:?}");
            default
        }
    }
}

pub fn infer_string<K>(key: K) -> Result<String>
where
    K: AsRef<str>,
{
    let key = key.as_ref();

    ::std::env::var(key).map_err(|_| anyhow!("failed to find the environment variable: {key}"))
}
