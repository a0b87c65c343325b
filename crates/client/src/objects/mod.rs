//! Value objects over the JSON the API returns.
//!
//! Each wrapper implements `ToResourceKey`, so it can be passed wherever a
//! resource URL is expected.

mod collection;
mod document;
mod group;
mod item;
mod item_list;

pub use collection::Collection;
pub use document::Document;
pub use group::ItemGroup;
pub use item::{Item, NO_PRIMARY_TEXT, primary_text_url};
pub use item_list::{ItemList, ItemListIndex, ItemListSummary, ListCategory};
