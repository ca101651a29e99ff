// ==========================================
// 制造运营管理系统 - 通知与加载门控
// ==========================================
// 职责: 定义展示层协作者的窄接口，实现依赖倒置
// - NotificationSink: show(kind, title, description)
// - LoadingGate: set_busy(bool)
// 说明: 引擎层只依赖 trait，具体渲染由调用方注入
// ==========================================

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::types::NotificationKind;
use crate::i18n::{t, t_with_args};

// ==========================================
// Notification - 通知内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }

    /// 成功通知（标题取当前语言）
    pub fn success(description: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::Success,
            t("work_order.notify.success_title"),
            description,
        )
    }

    /// 失败通知（标题取当前语言）
    pub fn danger(description: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::Danger,
            t("work_order.notify.error_title"),
            description,
        )
    }

    /// 按 i18n 键构造失败通知
    pub fn danger_with(key: &str, args: &[(&str, &str)]) -> Self {
        Self::danger(t_with_args(key, args))
    }

    /// 按 i18n 键构造成功通知
    pub fn success_with(key: &str, args: &[(&str, &str)]) -> Self {
        Self::success(t_with_args(key, args))
    }
}

// ==========================================
// 展示层 Trait
// ==========================================

/// 通知输出
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: Notification);
}

/// 忙碌状态门控
///
/// 保存/加载期间置 true，结束（无论成败）置 false
pub trait LoadingGate: Send + Sync {
    fn set_busy(&self, busy: bool);
}

// ==========================================
// 默认实现
// ==========================================

/// 空操作通知输出
///
/// 用于不需要展示通知的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn show(&self, notification: Notification) {
        tracing::debug!(
            kind = %notification.kind,
            "NoOpNotificationSink: 跳过通知 - {}",
            notification.description
        );
    }
}

/// 写日志的通知输出（无界面时使用）
#[derive(Debug, Clone, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn show(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationKind::Danger => tracing::warn!(
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
    }
}

/// 空操作门控
#[derive(Debug, Clone, Default)]
pub struct NoOpLoadingGate;

impl LoadingGate for NoOpLoadingGate {
    fn set_busy(&self, busy: bool) {
        tracing::trace!(busy, "NoOpLoadingGate");
    }
}

// ==========================================
// SharedLoadingGate - 引用计数的加载门控
// ==========================================
// 目录加载与保存共用同一个门控：
// 第一个占用者打开忙碌状态，最后一个释放者关闭
pub struct SharedLoadingGate {
    inner: Arc<dyn LoadingGate>,
    holders: Mutex<usize>,
}

impl SharedLoadingGate {
    pub fn new(inner: Arc<dyn LoadingGate>) -> Self {
        Self {
            inner,
            holders: Mutex::new(0),
        }
    }

    /// 当前占用者数量
    pub fn holders(&self) -> usize {
        *self.holders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LoadingGate for SharedLoadingGate {
    fn set_busy(&self, busy: bool) {
        let mut holders = self.holders.lock().unwrap_or_else(PoisonError::into_inner);
        if busy {
            *holders += 1;
            if *holders == 1 {
                self.inner.set_busy(true);
            }
            return;
        }

        match *holders {
            0 => tracing::warn!("加载门控未占用却收到释放"),
            1 => {
                *holders = 0;
                self.inner.set_busy(false);
            }
            _ => *holders -= 1,
        }
    }
}
