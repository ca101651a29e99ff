use crate::domain::work_order::WorkOrderDetail;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::DATETIME_FORMAT;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkOrderDetailRepository - 工单明细仓储
// ==========================================
pub struct WorkOrderDetailRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderDetailRepository {
    /// 创建新的WorkOrderDetailRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入某工单的明细，并标记该工单的明细已提交（单事务，全部成功或全部回滚）
    ///
    /// # 参数
    /// - `work_order_id`: 父工单ID；每行明细的父工单ID必须与之一致
    /// - `details`: 按集合顺序写入 seq_no；允许为空（仍会标记提交）
    /// - `committed_at`: 提交时间
    ///
    /// # 返回
    /// - `Ok(ids)`: 新明细ID，与入参顺序一致
    pub fn insert_batch(
        &self,
        work_order_id: &str,
        details: &[WorkOrderDetail],
        committed_at: NaiveDateTime,
    ) -> RepositoryResult<Vec<String>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let marked = tx.execute(
            "UPDATE work_order SET details_committed_at = ? WHERE work_order_id = ?",
            params![committed_at.format(DATETIME_FORMAT).to_string(), work_order_id],
        )?;
        if marked == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: work_order_id.to_string(),
            });
        }

        let mut ids = Vec::with_capacity(details.len());
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO work_order_detail (
                    work_order_detail_id, work_order_id, master_production_schedule_id, seq_no,
                    note, projected_production, actual_production, faulty_products,
                    actual_production_price, faulty_product_price
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )?;

            for (seq_no, detail) in details.iter().enumerate() {
                if detail.work_order_id.as_deref() != Some(work_order_id) {
                    return Err(RepositoryError::FieldValueError {
                        field: "work_order_id".to_string(),
                        message: format!("第{}行明细不属于工单{}", seq_no + 1, work_order_id),
                    });
                }

                let detail_id = uuid::Uuid::new_v4().to_string();
                stmt.execute(params![
                    &detail_id,
                    work_order_id,
                    &detail.master_production_schedule_id,
                    seq_no as i64,
                    &detail.note,
                    detail.projected_production,
                    detail.actual_production,
                    detail.faulty_products,
                    detail.actual_production_price,
                    detail.faulty_product_price,
                ])?;
                ids.push(detail_id);
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(ids)
    }

    /// 查询某工单的全部明细（按 seq_no 升序）
    pub fn find_by_work_order(&self, work_order_id: &str) -> RepositoryResult<Vec<WorkOrderDetail>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT work_order_detail_id, work_order_id, master_production_schedule_id,
                      note, projected_production, actual_production, faulty_products,
                      actual_production_price, faulty_product_price
               FROM work_order_detail
               WHERE work_order_id = ?
               ORDER BY seq_no"#,
        )?;

        let details = stmt
            .query_map(params![work_order_id], |row| {
                Ok(WorkOrderDetail {
                    key: Default::default(),
                    work_order_detail_id: Some(row.get(0)?),
                    work_order_id: Some(row.get(1)?),
                    master_production_schedule_id: row.get(2)?,
                    note: row.get(3)?,
                    projected_production: row.get(4)?,
                    actual_production: row.get(5)?,
                    faulty_products: row.get(6)?,
                    actual_production_price: row.get(7)?,
                    faulty_product_price: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<WorkOrderDetail>, _>>()?;

        Ok(details)
    }
}
