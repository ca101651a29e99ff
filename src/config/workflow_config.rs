// ==========================================
// 制造运营管理系统 - 工单工作流配置快照
// ==========================================
// 由 ConfigManager::load_workflow_config 从 config_kv 读取
// ==========================================

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::save_coordinator::SaveConfig;
use crate::engine::session::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// 保存成功到完成回调的延时（毫秒）
    pub save_success_delay_ms: u64,
    /// 单次远程调用超时（毫秒）
    pub remote_timeout_ms: u64,
    /// 工厂时区相对 UTC 的偏移（分钟）
    pub plant_utc_offset_minutes: i32,
    /// 阶段1是否携带幂等键
    pub idempotent_create: bool,
    /// 孤儿工单宽限期（分钟）
    pub orphan_grace_minutes: i64,
    /// HTTP 远程存储根地址
    pub remote_base_url: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            save_success_delay_ms: 4_000,
            remote_timeout_ms: 15_000,
            plant_utc_offset_minutes: 0,
            idempotent_create: true,
            orphan_grace_minutes: 60,
            remote_base_url: "http://127.0.0.1:8080/api".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn save_success_delay(&self) -> Duration {
        Duration::from_millis(self.save_success_delay_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn orphan_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.orphan_grace_minutes.max(0))
    }

    /// 工厂时区偏移；超出 ±24h 时回退为 UTC
    pub fn plant_offset(&self) -> FixedOffset {
        match FixedOffset::east_opt(self.plant_utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    plant_utc_offset_minutes = self.plant_utc_offset_minutes,
                    "工厂时区偏移无效，回退为 UTC"
                );
                Utc.fix()
            }
        }
    }

    pub fn save_config(&self) -> SaveConfig {
        SaveConfig {
            remote_timeout: self.remote_timeout(),
            idempotent_create: self.idempotent_create,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            save: self.save_config(),
            success_delay: self.save_success_delay(),
            plant_offset: self.plant_offset(),
        }
    }
}
