//! Resource keys.
//!
//! Every cached resource is addressed by the canonical URL string of the
//! remote resource. Domain wrappers implement [`ToResourceKey`] so callers
//! convert at the boundary and the cache only ever sees a [`ResourceKey`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical URL of a remote resource, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl From<String> for ResourceKey {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// Anything that identifies a remote resource by its URL.
pub trait ToResourceKey {
    fn to_resource_key(&self) -> ResourceKey;
}

impl ToResourceKey for ResourceKey {
    fn to_resource_key(&self) -> ResourceKey {
        self.clone()
    }
}

impl ToResourceKey for str {
    fn to_resource_key(&self) -> ResourceKey {
        ResourceKey::from(self)
    }
}

impl ToResourceKey for String {
    fn to_resource_key(&self) -> ResourceKey {
        ResourceKey::from(self.as_str())
    }
}

impl<T: ToResourceKey + ?Sized> ToResourceKey for &T {
    fn to_resource_key(&self) -> ResourceKey {
        (**self).to_resource_key()
    }
}
