//! CRUD access to one REST collection.
//!
//! [`Collection`] is the seam between the managers and the transport: the
//! REST implementation lives here, an in-memory one backs the tests.

use std::future::Future;
use std::marker::PhantomData;

use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::model::{Product, ProductPatch, Record};

pub trait Collection<R: Record>: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<R>, ApiError>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = Result<R, ApiError>> + Send;

    fn create(&self, draft: &R::Draft) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Full replace of the editable fields (PUT).
    fn replace(
        &self,
        id: i64,
        draft: &R::Draft,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Partial updates, only offered by the product resource.
pub trait PatchProducts: Send + Sync {
    fn patch(
        &self,
        id: i64,
        patch: &ProductPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Clone, Debug)]
pub struct RestCollection<R> {
    client: ApiClient,
    path: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RestCollection<R> {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), id)
    }
}

impl<R: Record> Collection<R> for RestCollection<R> {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.client.get_json(&self.path).await
    }

    async fn get(&self, id: i64) -> Result<R, ApiError> {
        self.client.get_json(&self.item_path(id)).await
    }

    async fn create(&self, draft: &R::Draft) -> Result<(), ApiError> {
        self.client
            .send_json(Method::POST, &self.path, draft)
            .await
            .map(|_| ())
    }

    async fn replace(&self, id: i64, draft: &R::Draft) -> Result<(), ApiError> {
        self.client
            .send_json(Method::PUT, &self.item_path(id), draft)
            .await
            .map(|_| ())
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&self.item_path(id)).await
    }
}

impl PatchProducts for RestCollection<Product> {
    async fn patch(&self, id: i64, patch: &ProductPatch) -> Result<(), ApiError> {
        self.client
            .send_json(Method::PATCH, &self.item_path(id), patch)
            .await
            .map(|_| ())
    }
}
