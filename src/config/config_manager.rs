// ==========================================
// 制造运营管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::workflow_config::WorkflowConfig;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析配置；无法解析时记 warn 并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw = %raw,
                        fallback = %default,
                        "配置值无法解析，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 工单工作流配置 =====

    pub fn get_save_success_delay_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::SAVE_SUCCESS_DELAY_MS, 4_000u64)
    }

    pub fn get_remote_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::REMOTE_TIMEOUT_MS, 15_000u64)?;
        // 0 等同于立即超时，不可用
        Ok(if value == 0 { 15_000 } else { value })
    }

    pub fn get_plant_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::PLANT_UTC_OFFSET_MINUTES, 0i32)
    }

    pub fn get_idempotent_create(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::IDEMPOTENT_CREATE, "true")?;
        Ok(!matches!(
            value.trim().to_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ))
    }

    pub fn get_orphan_grace_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::ORPHAN_GRACE_MINUTES, 60i64)
    }

    pub fn get_remote_base_url(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::REMOTE_BASE_URL, "http://127.0.0.1:8080/api")
    }

    /// 读取工作流配置快照
    pub fn load_workflow_config(&self) -> Result<WorkflowConfig, Box<dyn Error>> {
        Ok(WorkflowConfig {
            save_success_delay_ms: self.get_save_success_delay_ms()?,
            remote_timeout_ms: self.get_remote_timeout_ms()?,
            plant_utc_offset_minutes: self.get_plant_utc_offset_minutes()?,
            idempotent_create: self.get_idempotent_create()?,
            orphan_grace_minutes: self.get_orphan_grace_minutes()?,
            remote_base_url: self.get_remote_base_url()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 保存流程
    pub const SAVE_SUCCESS_DELAY_MS: &str = "save_success_delay_ms";
    pub const REMOTE_TIMEOUT_MS: &str = "remote_timeout_ms";
    pub const IDEMPOTENT_CREATE: &str = "idempotent_create";

    // 工厂日历
    pub const PLANT_UTC_OFFSET_MINUTES: &str = "plant_utc_offset_minutes";

    // 对账
    pub const ORPHAN_GRACE_MINUTES: &str = "orphan_grace_minutes";

    // 远程存储
    pub const REMOTE_BASE_URL: &str = "remote_base_url";
}
