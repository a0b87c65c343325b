//! Client for the Alveo research data API.
//!
//! Requests go through a [`Transport`]; item metadata, documents and primary
//! texts are kept in the local cache from `alveo-core`.

pub mod client;
pub mod objects;
pub mod outcome;
pub mod transport;

pub use client::{CachePolicy, Client, DocumentSource};
pub use objects::{Collection, Document, Item, ItemGroup, ItemList, ItemListIndex, ItemListSummary, ListCategory};
pub use outcome::ApiOutcome;
pub use transport::{ApiError, ApiRequest, Credentials, HttpTransport, Method, MultipartBody, Transport};
