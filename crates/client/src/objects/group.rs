use alveo_core::{ResourceKey, ToResourceKey};

/// An ordered set of item URLs.
///
/// Insertion order is kept and duplicates are dropped, so the set
/// operations below are stable with respect to the left operand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemGroup {
    urls: Vec<ResourceKey>,
}

impl ItemGroup {
    pub fn new<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: ToResourceKey,
    {
        let mut group = Self::default();
        for item in items {
            group.push(item.to_resource_key());
        }
        group
    }

    /// Append a URL unless it is already present.
    pub fn push(&mut self, url: ResourceKey) -> bool {
        if self.urls.contains(&url) {
            return false;
        }
        self.urls.push(url);
        true
    }

    pub fn urls(&self) -> &[ResourceKey] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResourceKey> {
        self.urls.get(index)
    }

    pub fn contains(&self, item: &impl ToResourceKey) -> bool {
        self.urls.contains(&item.to_resource_key())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceKey> {
        self.urls.iter()
    }

    /// Items of `self` followed by those of `other` not already in `self`.
    pub fn union(&self, other: &ItemGroup) -> ItemGroup {
        let mut combined = self.clone();
        for url in &other.urls {
            combined.push(url.clone());
        }
        combined
    }

    /// Items of `self` that are not in `other`.
    pub fn difference(&self, other: &ItemGroup) -> ItemGroup {
        self.urls.iter().filter(|url| !other.urls.contains(url)).collect()
    }

    /// Items of `self` that are also in `other`.
    pub fn intersection(&self, other: &ItemGroup) -> ItemGroup {
        self.urls.iter().filter(|url| other.urls.contains(url)).collect()
    }

    /// URLs as plain strings, for request bodies.
    pub fn to_strings(&self) -> Vec<String> {
        self.urls.iter().map(|url| url.as_str().to_string()).collect()
    }
}

impl<'a> FromIterator<&'a ResourceKey> for ItemGroup {
    fn from_iter<I: IntoIterator<Item = &'a ResourceKey>>(iter: I) -> Self {
        ItemGroup::new(iter)
    }
}

impl FromIterator<ResourceKey> for ItemGroup {
    fn from_iter<I: IntoIterator<Item = ResourceKey>>(iter: I) -> Self {
        ItemGroup::new(iter)
    }
}

impl<'a> IntoIterator for &'a ItemGroup {
    type Item = &'a ResourceKey;
    type IntoIter = std::slice::Iter<'a, ResourceKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}
