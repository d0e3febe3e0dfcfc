//! HTTP implementation of the remote store, speaking the Firebase
//! Realtime Database REST dialect.

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::api_types::{ApiCollection, ApiCreated};
use super::types::{Item, ItemPatch, NewItem};
use super::{RemoteStore, StoreError};

/// Collection path under the database root.
const COLLECTION: &str = "todos";

/// Remote store client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpStore {
  http: reqwest::Client,
  base: Url,
}

impl HttpStore {
  pub fn new(base: Url) -> Self {
    Self {
      http: reqwest::Client::new(),
      base,
    }
  }

  /// `{base}/todos.json`
  fn collection_path(&self) -> String {
    format!(
      "{}/{}.json",
      self.base.as_str().trim_end_matches('/'),
      COLLECTION
    )
  }

  /// `{base}/todos/{key}.json`
  fn item_path(&self, key: &str) -> String {
    format!(
      "{}/{}/{}.json",
      self.base.as_str().trim_end_matches('/'),
      COLLECTION,
      key
    )
  }

  /// One round trip; non-2xx becomes a [`StoreError::Status`].
  async fn send<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: String,
    body: Option<&B>,
  ) -> Result<Response, StoreError> {
    let mut request = self.http.request(method.clone(), &path);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      debug!(%method, %status, %path, "store rejected request");
      return Err(StoreError::Status {
        method,
        path,
        status,
      });
    }

    Ok(response)
  }
}

#[async_trait]
impl RemoteStore for HttpStore {
  async fn fetch_all(&self) -> Result<Vec<Item>, StoreError> {
    let response = self
      .send::<()>(Method::GET, self.collection_path(), None)
      .await?;
    let collection: ApiCollection = response.json().await.map_err(StoreError::Decode)?;
    Ok(collection.into_items())
  }

  async fn create(&self, item: &NewItem) -> Result<Option<String>, StoreError> {
    let response = self
      .send(Method::POST, self.collection_path(), Some(item))
      .await?;
    let created: ApiCreated = response.json().await.map_err(StoreError::Decode)?;
    Ok(created.name)
  }

  async fn update(&self, key: &str, patch: &ItemPatch) -> Result<(), StoreError> {
    self
      .send(Method::PATCH, self.item_path(key), Some(patch))
      .await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    self
      .send::<()>(Method::DELETE, self.item_path(key), None)
      .await?;
    Ok(())
  }
}
