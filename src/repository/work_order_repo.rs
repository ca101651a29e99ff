use crate::domain::types::WorkOrderStatus;
use crate::domain::work_order::WorkOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{date_column, datetime_column, DATETIME_FORMAT, DATE_FORMAT};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"SELECT work_order_id, product_manager_id, date_start, date_end,
                                       work_order_status, client_ref, created_at
                                FROM work_order"#;

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的WorkOrderRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建工单
    ///
    /// # 参数
    /// - `work_order_id`: 服务端生成的工单ID
    /// - `work_order`: 工单载荷
    /// - `created_at`: 落库时间
    pub fn insert(
        &self,
        work_order_id: &str,
        work_order: &WorkOrder,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO work_order (
                work_order_id, product_manager_id, date_start, date_end,
                work_order_status, client_ref, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                work_order_id,
                work_order.product_manager_id(),
                work_order.date_start().format(DATE_FORMAT).to_string(),
                work_order.date_end().format(DATE_FORMAT).to_string(),
                work_order.status.as_str(),
                &work_order.client_ref,
                created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;

        Ok(work_order_id.to_string())
    }

    /// 按work_order_id查询工单
    pub fn find_by_id(&self, work_order_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!("{} WHERE work_order_id = ?", SELECT_COLUMNS);
        let work_order = conn
            .query_row(&sql, params![work_order_id], map_row)
            .optional()?;

        Ok(work_order)
    }

    /// 按客户端幂等键查询工单
    pub fn find_by_client_ref(&self, client_ref: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!("{} WHERE client_ref = ?", SELECT_COLUMNS);
        let work_order = conn
            .query_row(&sql, params![client_ref], map_row)
            .optional()?;

        Ok(work_order)
    }

    /// 查询某个生产经理的全部工单（按创建时间降序）
    pub fn list_by_manager(&self, product_manager_id: &str) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE product_manager_id = ? ORDER BY created_at DESC, work_order_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let work_orders = stmt
            .query_map(params![product_manager_id], map_row)?
            .collect::<Result<Vec<WorkOrder>, _>>()?;

        Ok(work_orders)
    }

    /// 查询孤儿工单：明细从未提交（details_committed_at 为空）、且创建时间早于 `created_before`
    ///
    /// 两阶段保存的第二阶段失败后，父工单会以未提交明细的状态残留在库中；
    /// 已提交零明细的工单是正常保存结果，不计入
    pub fn find_orphans(&self, created_before: NaiveDateTime) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"{} WHERE created_at < ?
                 AND details_committed_at IS NULL
               ORDER BY created_at"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let work_orders = stmt
            .query_map(
                params![created_before.format(DATETIME_FORMAT).to_string()],
                map_row,
            )?
            .collect::<Result<Vec<WorkOrder>, _>>()?;

        Ok(work_orders)
    }

    /// 删除孤儿工单
    ///
    /// # 返回
    /// - `Ok(n)`: 删除的工单数量
    pub fn delete_orphans(&self, created_before: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"DELETE FROM work_order
               WHERE created_at < ?
                 AND details_committed_at IS NULL"#,
            params![created_before.format(DATETIME_FORMAT).to_string()],
        )?;

        Ok(affected)
    }
}

/// 映射数据库行到WorkOrder对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkOrder> {
    let date_start = date_column(row, 2)?;
    let date_end = date_column(row, 3)?;
    let status = WorkOrderStatus::from_str(&row.get::<_, String>(4)?);

    let mut work_order =
        WorkOrder::from_parts(row.get::<_, String>(1)?, date_start, date_end, status).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)),
        )?;
    work_order.work_order_id = Some(row.get(0)?);
    work_order.client_ref = row.get(5)?;
    work_order.created_at = Some(datetime_column(row, 6)?);

    Ok(work_order)
}
