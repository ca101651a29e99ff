// ==========================================
// 制造运营管理系统 - 引擎层错误与状态
// ==========================================
// 职责: 明细编辑错误、保存阶段失败原因、保存状态机、会话错误
// ==========================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::work_order::{DateRangeError, DetailKey, WorkOrderDetail};

// ==========================================
// EditorError - 明细编辑错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("明细行索引越界: index={index}, len={len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("明细行不存在: key={0}")]
    UnknownKey(DetailKey),

    #[error("尚无明细行可关联主生产计划")]
    NoDraftRows,

    #[error("未知明细字段: {0}")]
    UnknownField(String),

    #[error("字段 {field} 的取值无效: {value:?}")]
    InvalidFieldValue { field: String, value: String },
}

// ==========================================
// FailureReason - 远程调用失败原因
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// 响应缺失 result（含空响应体）
    #[error("响应缺少结果{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    EmptyResult { message: Option<String> },

    #[error("传输失败: {0}")]
    Transport(String),

    #[error("调用超时 ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },
}

impl FailureReason {
    /// 超时失败；超出 u64 的毫秒数按 u64::MAX 记
    pub fn timeout(timeout: Duration) -> Self {
        FailureReason::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

// ==========================================
// SavePhase / SaveState - 保存状态机
// ==========================================
// Idle → Saving(Phase1) → Saving(Phase2) → Succeeded | FailedPhase1 | FailedPhase2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    CreateWorkOrder,
    CreateDetails,
}

impl fmt::Display for SavePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavePhase::CreateWorkOrder => write!(f, "phase1"),
            SavePhase::CreateDetails => write!(f, "phase2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Saving { phase: SavePhase },
    Succeeded { work_order_id: String, detail_count: usize },
    FailedPhase1 { reason: FailureReason },
    /// 父工单已持久化、明细为零（孤儿工单）
    FailedPhase2 { work_order_id: String, reason: FailureReason },
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveState::Saving { .. })
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, SaveState::Succeeded { .. })
    }
}

// ==========================================
// SaveOutcome - 单次保存结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Succeeded {
        work_order_id: String,
        details: Vec<WorkOrderDetail>,
    },
    FailedPhase1 {
        reason: FailureReason,
    },
    FailedPhase2 {
        work_order_id: String,
        details: Vec<WorkOrderDetail>,
        reason: FailureReason,
    },
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Succeeded { .. })
    }

    /// 已持久化的父工单ID（第一阶段成功时才有）
    pub fn work_order_id(&self) -> Option<&str> {
        match self {
            SaveOutcome::Succeeded { work_order_id, .. }
            | SaveOutcome::FailedPhase2 { work_order_id, .. } => Some(work_order_id),
            SaveOutcome::FailedPhase1 { .. } => None,
        }
    }
}

/// 保存请求被拒绝（未发出任何远程调用）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejected {
    #[error("保存进行中，不接受重复提交")]
    InProgress,

    #[error("工单已保存")]
    AlreadySaved,
}

// ==========================================
// SessionError - 会话操作错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error("保存进行中，编辑已冻结")]
    SaveInProgress,

    #[error("工单已保存，不可再编辑")]
    AlreadySaved,

    #[error("主生产计划不在目录中: {0}")]
    UnknownScheduleItem(String),

    #[error("主生产计划目录加载失败: {0}")]
    Catalog(FailureReason),
}

impl From<SaveRejected> for SessionError {
    fn from(rejected: SaveRejected) -> Self {
        match rejected {
            SaveRejected::InProgress => SessionError::SaveInProgress,
            SaveRejected::AlreadySaved => SessionError::AlreadySaved,
        }
    }
}
