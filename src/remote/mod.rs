// ==========================================
// 制造运营管理系统 - 远程存储适配层
// ==========================================
// 职责: 定义工单流程依赖的三个远程操作
// - create_work_order: 创建父工单 → { result: id }
// - create_work_order_details: 按父工单批量创建明细（可为空批量）→ ack
// - fetch_schedule_catalog: 主生产计划目录 → { result: [...] }
// 说明: result 缺失/为 null 即视为失败，与传输错误走同一路径
// ==========================================

pub mod http;
pub mod local;

pub use http::HttpRemote;
pub use local::LocalRemote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::domain::work_order::{WorkOrder, WorkOrderDetail};

// ==========================================
// RemoteResponse - 响应信封
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse<T> {
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> RemoteResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            result: None,
            message: Some(message.into()),
        }
    }

    /// 空信封（无 result 且无说明）
    pub fn empty() -> Self {
        Self {
            result: None,
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

// ==========================================
// RemoteError - 传输层错误
// ==========================================
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("传输失败: {0}")]
    Transport(String),

    #[error("响应解析失败: {0}")]
    Decode(String),

    #[error("后台任务失败: {0}")]
    Join(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for RemoteError {
    fn from(err: tokio::task::JoinError) -> Self {
        RemoteError::Join(err.to_string())
    }
}

pub type RemoteResult<T> = Result<RemoteResponse<T>, RemoteError>;

// ==========================================
// WorkOrderRemote - 远程存储 Trait
// ==========================================

/// 工单远程存储
///
/// # 实现
/// - `LocalRemote`: 进程内调用 `WorkOrderApi`（SQLite）
/// - `HttpRemote`: 通过 HTTP 调用远程服务
#[async_trait]
pub trait WorkOrderRemote: Send + Sync {
    /// 第一阶段：创建父工单，成功时 result 为工单ID
    async fn create_work_order(
        &self,
        credentials: &Credentials,
        work_order: &WorkOrder,
    ) -> RemoteResult<String>;

    /// 第二阶段：为父工单批量创建明细，成功时 result 为任意非 null 确认
    ///
    /// 父工单ID单独传递，空批量也能让存储端登记明细已提交
    async fn create_work_order_details(
        &self,
        credentials: &Credentials,
        work_order_id: &str,
        details: &[WorkOrderDetail],
    ) -> RemoteResult<serde_json::Value>;

    /// 拉取主生产计划目录
    async fn fetch_schedule_catalog(
        &self,
        credentials: &Credentials,
    ) -> RemoteResult<Vec<ScheduleItem>>;
}
