// ==========================================
// 制造运营管理系统 - HTTP 远程适配器
// ==========================================
// 接口:
// - POST {base}/workorder        载荷: WorkOrder
// - POST {base}/workorderdetail?workOrderID=<父工单ID>  载荷: [WorkOrderDetail]
// - GET  {base}/mps
// 认证: Authorization: Bearer <token>
// ==========================================

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::domain::work_order::{WorkOrder, WorkOrderDetail};
use crate::remote::{RemoteError, RemoteResponse, RemoteResult, WorkOrderRemote};

/// 失败信封中保留的响应体长度上限
const BODY_SNIPPET_LEN: usize = 200;

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> RemoteResult<T> {
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }
}

/// 解析响应信封
///
/// - 非 2xx: 失败信封（携带状态码与响应体片段）
/// - 空响应体或 `null`: 空信封
/// - JSON 格式错误: `RemoteError::Decode`
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> RemoteResult<T> {
    if !status.is_success() {
        let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        tracing::warn!(status = %status, body = %snippet, "远程接口返回非成功状态");
        return Ok(RemoteResponse::failed(format!("HTTP {}: {}", status, snippet)));
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(RemoteResponse::empty());
    }

    serde_json::from_str::<RemoteResponse<T>>(trimmed)
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl WorkOrderRemote for HttpRemote {
    async fn create_work_order(
        &self,
        credentials: &Credentials,
        work_order: &WorkOrder,
    ) -> RemoteResult<String> {
        let response = self
            .client
            .post(self.url("workorder"))
            .bearer_auth(&credentials.token)
            .json(work_order)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    async fn create_work_order_details(
        &self,
        credentials: &Credentials,
        work_order_id: &str,
        details: &[WorkOrderDetail],
    ) -> RemoteResult<serde_json::Value> {
        let response = self
            .client
            .post(self.url("workorderdetail"))
            .query(&[("workOrderID", work_order_id)])
            .bearer_auth(&credentials.token)
            .json(details)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    async fn fetch_schedule_catalog(
        &self,
        credentials: &Credentials,
    ) -> RemoteResult<Vec<ScheduleItem>> {
        let response = self
            .client
            .get(self.url("mps"))
            .bearer_auth(&credentials.token)
            .send()
            .await?;

        Self::read_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_and_null_bodies() {
        let resp: RemoteResponse<String> = decode_envelope(StatusCode::OK, "").unwrap();
        assert!(!resp.is_success());
        assert!(resp.message.is_none());

        let resp: RemoteResponse<String> = decode_envelope(StatusCode::OK, " null ").unwrap();
        assert!(!resp.is_success());
    }

    #[test]
    fn test_decode_non_success_status() {
        let resp: RemoteResponse<String> =
            decode_envelope(StatusCode::INTERNAL_SERVER_ERROR, "db down").unwrap();
        assert!(!resp.is_success());
        let message = resp.message.unwrap();
        assert!(message.contains("500"));
        assert!(message.contains("db down"));
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode_envelope::<String>(StatusCode::OK, "{not json").unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let remote = HttpRemote::new("http://localhost:8080/api/");
        assert_eq!(remote.base_url(), "http://localhost:8080/api");
        assert_eq!(remote.url("mps"), "http://localhost:8080/api/mps");
    }
}
