// ==========================================
// 制造运营管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 工单后端存储的建表脚本（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS master_production_schedule (
    mps_id TEXT PRIMARY KEY,
    product_name TEXT NOT NULL DEFAULT '',
    date_start TEXT,
    date_end TEXT,
    quantity INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS work_order (
    work_order_id TEXT PRIMARY KEY,
    product_manager_id TEXT NOT NULL,
    date_start TEXT NOT NULL,
    date_end TEXT NOT NULL,
    work_order_status TEXT NOT NULL DEFAULT 'pending',
    client_ref TEXT UNIQUE,
    created_at TEXT NOT NULL,
    -- 明细批量写入完成时间（空批量同样写入）；为空表示阶段2未完成
    details_committed_at TEXT,
    CHECK (date_start <= date_end)
);

CREATE INDEX IF NOT EXISTS idx_work_order_manager
  ON work_order(product_manager_id, created_at);

CREATE TABLE IF NOT EXISTS work_order_detail (
    work_order_detail_id TEXT PRIMARY KEY,
    work_order_id TEXT NOT NULL REFERENCES work_order(work_order_id) ON DELETE CASCADE,
    master_production_schedule_id TEXT REFERENCES master_production_schedule(mps_id),
    seq_no INTEGER NOT NULL,
    note TEXT NOT NULL DEFAULT '',
    projected_production INTEGER NOT NULL DEFAULT 0,
    actual_production INTEGER NOT NULL DEFAULT 0,
    faulty_products INTEGER NOT NULL DEFAULT 0,
    actual_production_price REAL NOT NULL DEFAULT 0,
    faulty_product_price REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_work_order_detail_parent
  ON work_order_detail(work_order_id, seq_no);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    migrate_v2_details_committed(conn)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// v1 → v2: work_order 增加 details_committed_at
///
/// v1 库中已有明细的工单视为阶段2已完成（以 created_at 回填）
fn migrate_v2_details_committed(conn: &Connection) -> rusqlite::Result<()> {
    let has_column: bool = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info('work_order') WHERE name = 'details_committed_at'",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if has_column {
        return Ok(());
    }

    tracing::info!("迁移 schema: work_order.details_committed_at");
    conn.execute_batch(
        r#"ALTER TABLE work_order ADD COLUMN details_committed_at TEXT;
           UPDATE work_order SET details_committed_at = created_at
           WHERE EXISTS (
               SELECT 1 FROM work_order_detail d
               WHERE d.work_order_id = work_order.work_order_id
           );"#,
    )
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
