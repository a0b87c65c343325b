use alveo_core::{ResourceKey, ToResourceKey};

/// A collection in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    url: ResourceKey,
}

impl Collection {
    /// The name is the last path segment of the URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string();
        Self { name, url: ResourceKey::new(url) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &ResourceKey {
        &self.url
    }
}

impl ToResourceKey for Collection {
    fn to_resource_key(&self) -> ResourceKey {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_url() {
        let c = Collection::from_url("https://app.alveo.edu.au/catalog/ace");
        assert_eq!(c.name(), "ace");
        assert_eq!(Collection::from_url("https://app.alveo.edu.au/catalog/cooee/").name(), "cooee");
    }
}
