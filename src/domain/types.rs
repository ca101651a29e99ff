// ==========================================
// 制造运营管理系统 - 领域类型定义
// ==========================================
// 职责: 工单状态、通知类型、明细字段等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 序列化格式: lowercase (与远程接口一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Pending,    // 待执行（新建工单的初始状态）
    InProgress, // 执行中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }

    /// 从字符串解析状态（未知值回退为 pending）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => WorkOrderStatus::Pending,
            "in_progress" | "inprogress" => WorkOrderStatus::InProgress,
            "completed" => WorkOrderStatus::Completed,
            "cancelled" | "canceled" => WorkOrderStatus::Cancelled,
            _ => WorkOrderStatus::Pending,
        }
    }
}

// ==========================================
// 通知类型 (Notification Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Danger => write!(f, "danger"),
        }
    }
}

// ==========================================
// 工单明细可编辑字段 (Detail Field)
// ==========================================
// 父工单ID与主生产计划引用不在此列：前者只在保存时盖章，后者走关联操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailField {
    Note,
    ProjectedProduction,
    ActualProduction,
    FaultyProducts,
    ActualProductionPrice,
    FaultyProductPrice,
}

impl DetailField {
    pub const ALL: [DetailField; 6] = [
        DetailField::Note,
        DetailField::ProjectedProduction,
        DetailField::ActualProduction,
        DetailField::FaultyProducts,
        DetailField::ActualProductionPrice,
        DetailField::FaultyProductPrice,
    ];

    /// 远程接口中的字段名
    pub fn wire_name(&self) -> &'static str {
        match self {
            DetailField::Note => "note",
            DetailField::ProjectedProduction => "projectedProduction",
            DetailField::ActualProduction => "actualProduction",
            DetailField::FaultyProducts => "faultyProducts",
            DetailField::ActualProductionPrice => "actualProductionPrice",
            DetailField::FaultyProductPrice => "faultyProductPrice",
        }
    }

    /// 解析字段名，同时接受 camelCase 与 snake_case
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_lowercase();

        DetailField::ALL
            .into_iter()
            .find(|field| field.wire_name().to_lowercase() == normalized)
    }

    /// 是否为数量类字段（整数）
    pub fn is_quantity(&self) -> bool {
        matches!(
            self,
            DetailField::ProjectedProduction
                | DetailField::ActualProduction
                | DetailField::FaultyProducts
        )
    }

    /// 是否为价格类字段（小数）
    pub fn is_price(&self) -> bool {
        matches!(
            self,
            DetailField::ActualProductionPrice | DetailField::FaultyProductPrice
        )
    }
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}
