pub mod http;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::errors::ApiError;

/// Authenticated client for the hospital backend.
///
/// Successful calls yield the decoded JSON body (`Value::Null` for an empty
/// body). Non-2xx answers surface as [`ApiError::Http`].
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError>;

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }
}
