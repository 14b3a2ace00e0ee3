//! JSON transport shared by every backend service.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::client::{ApiError, ApiResult};

/// Thin wrapper over `reqwest::Client` bound to a base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (with or without a leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self.client.get(self.url(path)).query(query);
        decode(send(request).await?).await
    }

    /// GET returning the raw body, for plain-text endpoints.
    pub async fn get_text(&self, path: &str) -> ApiResult<String> {
        let response = send(self.client.get(self.url(path))).await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Unavailable(e.to_string()))?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(ApiError::Status {
                code: status.as_u16(),
                body: text,
            })
        }
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, timeout: Option<Duration>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        decode(send(request).await?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.put(self.url(path)).json(body);
        decode(send(request).await?).await
    }

    /// PATCH with an empty JSON object as body.
    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self
            .client
            .patch(self.url(path))
            .json(&serde_json::Map::new());
        decode(send(request).await?).await
    }

    /// DELETE; any 2xx counts as success and the body is ignored.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = send(self.client.delete(self.url(path))).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}

async fn send(request: RequestBuilder) -> ApiResult<Response> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::Unavailable("request timed out".to_string())
        } else {
            ApiError::Unavailable(e.to_string())
        }
    })
}

/// Turn a response into `T`.
///
/// Non-2xx statuses become [`ApiError::Status`]. A 2xx body that is a bare
/// JSON string is the server's error message and becomes [`ApiError::Domain`].
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    if !status.is_success() {
        return Err(ApiError::Status {
            code: status.as_u16(),
            body: text,
        });
    }
    parse_body(&text)
}

pub(crate) fn parse_body<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))?;
    if let serde_json::Value::String(message) = value {
        return Err(ApiError::Domain(message));
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRecord;

    #[test]
    fn test_url_joining() {
        let http = HttpClient::new("http://localhost:8080/api/");
        assert_eq!(http.base_url(), "http://localhost:8080/api");
        assert_eq!(http.url("/uit/3"), "http://localhost:8080/api/uit/3");
        assert_eq!(http.url("rules"), "http://localhost:8080/api/rules");
    }

    #[test]
    fn test_parse_body_separates_string_messages() {
        let record: EntityRecord = parse_body(r#"{"id": 1, "monto": 5150.0}"#).unwrap();
        assert_eq!(record.id, Some(1));

        let err = parse_body::<EntityRecord>(r#""Backend no disponible""#).unwrap_err();
        assert_eq!(err, ApiError::Domain("Backend no disponible".to_string()));

        let err = parse_body::<EntityRecord>("not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
