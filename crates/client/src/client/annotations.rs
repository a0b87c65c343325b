//! Item annotations.

use alveo_core::{Error, ToResourceKey};
use serde_json::{Value, json};

use super::Client;
use crate::outcome::{check_success, field_as, message_text};
use crate::transport::{ApiRequest, Transport, parse_resource_url, with_query};

/// Keys every uploaded annotation must carry.
pub const REQUIRED_ANNOTATION_KEYS: [&str; 5] = ["@type", "label", "start", "end", "type"];

fn validate_annotations(annotations: &[Value]) -> Result<(), Error> {
    for (index, annotation) in annotations.iter().enumerate() {
        let Some(object) = annotation.as_object() else {
            return Err(Error::InvalidInput(format!("annotation {index} is not a JSON object")));
        };
        if let Some(missing) = REQUIRED_ANNOTATION_KEYS.iter().find(|key| !object.contains_key(**key)) {
            return Err(Error::InvalidInput(format!(
                "required key '{missing}' not present in annotation {index}"
            )));
        }
    }
    Ok(())
}

impl<T: Transport> Client<T> {
    /// Annotations of an item, optionally filtered by type and label.
    ///
    /// Returns `None` if the item's metadata has no annotations URL.
    pub async fn item_annotations(
        &self, item: &impl ToResourceKey, annotation_type: Option<&str>, label: Option<&str>,
    ) -> Result<Option<Value>, Error> {
        let item = self.get_item(item, false).await?;
        let Some(annotations_url) = item.annotations_url() else {
            return Ok(None);
        };

        let filters = annotation_type
            .map(|t| ("type", t))
            .into_iter()
            .chain(label.map(|l| ("label", l)));
        let url = with_query(parse_resource_url(annotations_url)?, filters);

        self.get_json(url).await.map(Some)
    }

    /// Annotation types present on an item.
    pub async fn annotation_types(&self, item: &impl ToResourceKey) -> Result<Vec<String>, Error> {
        let url = parse_resource_url(&format!("{}/annotations/types", item.to_resource_key()))?;
        let resp = self.get_json(url).await?;
        Ok(field_as(&resp, "annotation_types")?)
    }

    /// Upload annotations for an item; returns the server's success message.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` before any request is made if an annotation
    /// lacks one of [`REQUIRED_ANNOTATION_KEYS`].
    pub async fn add_annotations(&self, item: &impl ToResourceKey, annotations: Vec<Value>) -> Result<String, Error> {
        validate_annotations(&annotations)?;

        let url = parse_resource_url(&format!("{}/annotations", item.to_resource_key()))?;
        let context = self.endpoint("schema/json-ld")?;
        let body = json!({ "@context": context.as_str(), "@graph": annotations });

        let resp = self.send(ApiRequest::post(url, body)).await?;
        Ok(message_text(&check_success(&resp)?))
    }
}
