//! Monitored endpoints.

use serde::Serialize;

/// One monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Configuration key the target was derived from.
    pub name: String,
    /// URL probed with a GET request. Not validated here.
    pub url: String,
}

impl Target {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Derive the target list from an environment snapshot.
///
/// Every key starting with `prefix` becomes a target named after the key.
/// The result is sorted by name to keep logs stable; nothing downstream
/// depends on the order.
pub fn derive_targets<'a, I>(env: I, prefix: &str) -> Vec<Target>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut targets: Vec<Target> = env
        .into_iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, url)| Target::new(key.as_str(), url.as_str()))
        .collect();
    targets.sort_by(|a, b| a.name.cmp(&b.name));
    targets
}
