//! Item lists.

use alveo_core::{Error, ResourceKey, ToResourceKey};
use serde_json::json;

use super::Client;
use crate::objects::{ItemGroup, ItemList, ItemListIndex, ListCategory};
use crate::outcome::{check_success, field_as, message_text, parse_json};
use crate::transport::{ApiError, ApiRequest, Transport, parse_resource_url, with_query};

fn item_list_from(url: ResourceKey, resp: &serde_json::Value) -> Result<ItemList, ApiError> {
    let name: String = field_as(resp, "name")?;
    let items: Vec<String> = field_as(resp, "items")?;
    Ok(ItemList::new(name, url, ItemGroup::new(items)))
}

impl<T: Transport> Client<T> {
    /// The user's own item lists and those shared with them.
    pub async fn item_lists(&self) -> Result<ItemListIndex, Error> {
        let body = self.send(ApiRequest::get(self.endpoint("item_lists.json")?)).await?;
        Ok(parse_json(&body)?)
    }

    pub async fn get_item_list(&self, list: &impl ToResourceKey) -> Result<ItemList, Error> {
        let key = list.to_resource_key();
        let resp = self.get_json(parse_resource_url(key.as_str())?).await?;
        Ok(item_list_from(key, &resp)?)
    }

    /// Find an item list by name among the own or shared lists.
    pub async fn get_item_list_by_name(&self, name: &str, category: ListCategory) -> Result<ItemList, Error> {
        let index = self.item_lists().await?;
        let summary = index
            .find(name, category)
            .ok_or_else(|| Error::InvalidInput(format!("item list does not exist: {name}")))?;
        self.get_item_list(&summary.item_list_url).await
    }

    /// Add items to an existing list, identified by URL.
    pub async fn add_to_item_list(&self, items: &ItemGroup, list: &impl ToResourceKey) -> Result<String, Error> {
        let name = self.get_item_list(list).await?.name().to_string();
        self.add_to_item_list_by_name(items, &name).await
    }

    /// Add items to the named list, which the server creates if needed.
    pub async fn add_to_item_list_by_name(&self, items: &ItemGroup, name: &str) -> Result<String, Error> {
        let url = with_query(self.endpoint("item_lists")?, [("name", name)]);
        let body = json!({ "items": items.to_strings() });
        let resp = self.send(ApiRequest::post(url, body)).await?;
        Ok(message_text(&check_success(&resp)?))
    }

    pub async fn rename_item_list(&self, list: &impl ToResourceKey, new_name: &str) -> Result<ItemList, Error> {
        let key = list.to_resource_key();
        let url = parse_resource_url(key.as_str())?;
        let body = self.send(ApiRequest::put(url, json!({ "name": new_name }))).await?;
        let resp: serde_json::Value = parse_json(&body)?;

        if let Some(error) = resp.get("error") {
            return Err(Error::ApiFailed(format!("rename failed: {}", message_text(error))));
        }
        item_list_from(key, &resp).map_err(|_| Error::ApiFailed(format!("rename failed: {resp}")))
    }

    /// Delete an item list. A redirect reply also counts as success.
    pub async fn delete_item_list(&self, list: &impl ToResourceKey) -> Result<(), Error> {
        let url = parse_resource_url(list.to_resource_key().as_str())?;
        match self.transport.request(ApiRequest::delete(url)).await {
            Ok(body) => {
                check_success(&body).map_err(|_| Error::ApiFailed("delete operation failed".into()))?;
                Ok(())
            }
            Err(e) if e.status() == Some(302) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
