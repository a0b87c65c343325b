use alveo_core::{ResourceKey, ToResourceKey};
use serde::{Deserialize, Serialize};

use super::ItemGroup;

/// A named item list stored on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemList {
    name: String,
    url: ResourceKey,
    items: ItemGroup,
}

impl ItemList {
    pub fn new(name: impl Into<String>, url: ResourceKey, items: ItemGroup) -> Self {
        Self { name: name.into(), url, items }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &ResourceKey {
        &self.url
    }

    pub fn items(&self) -> &ItemGroup {
        &self.items
    }

    pub fn into_items(self) -> ItemGroup {
        self.items
    }
}

impl ToResourceKey for ItemList {
    fn to_resource_key(&self) -> ResourceKey {
        self.url.clone()
    }
}

/// Which item lists to search by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListCategory {
    #[default]
    Own,
    Shared,
}

/// Entry of the item list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListSummary {
    pub name: String,
    pub item_list_url: String,
    #[serde(default)]
    pub num_items: Option<u64>,
}

/// The user's own item lists and those shared with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListIndex {
    #[serde(default)]
    pub own: Vec<ItemListSummary>,
    #[serde(default)]
    pub shared: Vec<ItemListSummary>,
}

impl ItemListIndex {
    pub fn category(&self, category: ListCategory) -> &[ItemListSummary] {
        match category {
            ListCategory::Own => &self.own,
            ListCategory::Shared => &self.shared,
        }
    }

    pub fn find(&self, name: &str, category: ListCategory) -> Option<&ItemListSummary> {
        self.category(category).iter().find(|list| list.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookup_by_category() {
        let index: ItemListIndex = serde_json::from_str(
            r#"{
                "own": [{"name": "mine", "item_list_url": "https://app.alveo.edu.au/item_lists/1", "num_items": 3}],
                "shared": [{"name": "theirs", "item_list_url": "https://app.alveo.edu.au/item_lists/2"}]
            }"#,
        )
        .unwrap();

        assert_eq!(index.find("mine", ListCategory::Own).unwrap().num_items, Some(3));
        assert!(index.find("mine", ListCategory::Shared).is_none());
        assert_eq!(
            index.find("theirs", ListCategory::Shared).unwrap().item_list_url,
            "https://app.alveo.edu.au/item_lists/2"
        );
    }

    #[test]
    fn test_item_list_key_is_its_url() {
        let list = ItemList::new(
            "mine",
            ResourceKey::new("https://app.alveo.edu.au/item_lists/1"),
            ItemGroup::new(["http://x/1"]),
        );
        assert_eq!(list.to_resource_key().as_str(), "https://app.alveo.edu.au/item_lists/1");
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.name(), "mine");
    }
}
