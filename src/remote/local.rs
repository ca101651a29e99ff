// ==========================================
// 制造运营管理系统 - 进程内远程适配器
// ==========================================
// 职责: 以 WorkOrderRemote 形式暴露 WorkOrderApi
// 说明: API 为同步 SQLite 调用，放入 blocking 线程池执行
// ==========================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ApiError, WorkOrderApi};
use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::domain::work_order::{WorkOrder, WorkOrderDetail};
use crate::remote::{RemoteResponse, RemoteResult, WorkOrderRemote};

pub struct LocalRemote {
    api: Arc<WorkOrderApi>,
}

impl LocalRemote {
    pub fn new(api: Arc<WorkOrderApi>) -> Self {
        Self { api }
    }
}

/// API 错误转换为失败信封（result 为空）
fn into_envelope<T>(result: Result<T, ApiError>) -> RemoteResponse<T> {
    match result {
        Ok(value) => RemoteResponse::ok(value),
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "本地存储返回失败");
            RemoteResponse::failed(format!("[{}] {}", e.code(), e))
        }
    }
}

#[async_trait]
impl WorkOrderRemote for LocalRemote {
    async fn create_work_order(
        &self,
        credentials: &Credentials,
        work_order: &WorkOrder,
    ) -> RemoteResult<String> {
        let api = self.api.clone();
        let credentials = credentials.clone();
        let work_order = work_order.clone();

        let result = tokio::task::spawn_blocking(move || {
            api.create_work_order(&credentials, &work_order)
        })
        .await?;

        Ok(into_envelope(result))
    }

    async fn create_work_order_details(
        &self,
        credentials: &Credentials,
        work_order_id: &str,
        details: &[WorkOrderDetail],
    ) -> RemoteResult<serde_json::Value> {
        let api = self.api.clone();
        let credentials = credentials.clone();
        let work_order_id = work_order_id.to_string();
        let details = details.to_vec();

        let result = tokio::task::spawn_blocking(move || {
            api.create_work_order_details(&credentials, &work_order_id, &details)
        })
        .await?;

        Ok(into_envelope(
            result.map(|count| serde_json::json!({ "created": count })),
        ))
    }

    async fn fetch_schedule_catalog(
        &self,
        credentials: &Credentials,
    ) -> RemoteResult<Vec<ScheduleItem>> {
        let api = self.api.clone();
        let credentials = credentials.clone();

        let result =
            tokio::task::spawn_blocking(move || api.list_schedule_items(&credentials)).await?;

        Ok(into_envelope(result))
    }
}
