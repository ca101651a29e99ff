use crate::domain::schedule::ScheduleItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{optional_date_column, DATE_FORMAT};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ScheduleItemRepository - 主生产计划仓储
// ==========================================
// 工单流程只读；写入仅用于目录维护/初始化
pub struct ScheduleItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleItemRepository {
    /// 创建新的ScheduleItemRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖主生产计划条目
    pub fn upsert(&self, item: &ScheduleItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        upsert_row(&conn, item)?;
        Ok(())
    }

    /// 批量新增或覆盖（单事务，任一条失败则整批回滚）
    ///
    /// # 返回
    /// - `Ok(n)`: 写入条目数
    pub fn upsert_batch(&self, items: &[ScheduleItem]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for item in items {
            upsert_row(&tx, item)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(items.len())
    }

    /// 按mps_id查询
    pub fn find_by_id(&self, mps_id: &str) -> RepositoryResult<Option<ScheduleItem>> {
        let conn = self.get_conn()?;

        let item = conn
            .query_row(
                r#"SELECT mps_id, product_name, date_start, date_end, quantity
                   FROM master_production_schedule
                   WHERE mps_id = ?"#,
                params![mps_id],
                map_row,
            )
            .optional()?;

        Ok(item)
    }

    /// 查询全部主生产计划
    pub fn list_all(&self) -> RepositoryResult<Vec<ScheduleItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT mps_id, product_name, date_start, date_end, quantity
               FROM master_production_schedule
               ORDER BY date_start IS NULL, date_start, mps_id"#,
        )?;

        let items = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<ScheduleItem>, _>>()?;

        Ok(items)
    }
}

fn upsert_row(conn: &Connection, item: &ScheduleItem) -> rusqlite::Result<usize> {
    conn.execute(
        r#"INSERT INTO master_production_schedule (
            mps_id, product_name, date_start, date_end, quantity
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(mps_id) DO UPDATE SET
            product_name = ?2, date_start = ?3, date_end = ?4, quantity = ?5"#,
        params![
            &item.mps_id,
            &item.product_name,
            item.date_start.map(|d| d.format(DATE_FORMAT).to_string()),
            item.date_end.map(|d| d.format(DATE_FORMAT).to_string()),
            item.quantity,
        ],
    )
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ScheduleItem> {
    Ok(ScheduleItem {
        mps_id: row.get(0)?,
        product_name: row.get(1)?,
        date_start: optional_date_column(row, 2)?,
        date_end: optional_date_column(row, 3)?,
        quantity: row.get(4)?,
    })
}
