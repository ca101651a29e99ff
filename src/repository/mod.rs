// ==========================================
// 制造运营管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod schedule_repo;
pub mod work_order_detail_repo;
pub mod work_order_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use schedule_repo::ScheduleItemRepository;
pub use work_order_detail_repo::WorkOrderDetailRepository;
pub use work_order_repo::WorkOrderRepository;

use chrono::{NaiveDate, NaiveDateTime};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_failure<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

pub(crate) fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&row.get::<_, String>(idx)?, DATE_FORMAT)
        .map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn optional_date_column(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| conversion_failure(idx, e)),
        _ => Ok(None),
    }
}

pub(crate) fn datetime_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, DATETIME_FORMAT)
        .map_err(|e| conversion_failure(idx, e))
}
