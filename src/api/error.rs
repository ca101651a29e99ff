// ==========================================
// 制造运营管理系统 - 存储端接口错误
// ==========================================
// 经 LocalRemote 转为失败信封: "[CODE] 描述"
// ==========================================

use crate::domain::work_order::DateRangeError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用方错误 =====
    #[error("未授权: {0}")]
    Unauthorized(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("日期范围无效: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 并发提交同一草稿时，幂等键在写入瞬间冲突
    #[error("重复提交: {0}")]
    Conflict(String),

    #[error("引用无效: {0}")]
    ReferenceViolation(String),

    // ===== 存储错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误代码（用于失败信封）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InvalidDateRange(_) => "INVALID_DATE_RANGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ReferenceViolation(_) => "REFERENCE_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DuplicateClientRef(msg) => ApiError::Conflict(msg),
            RepositoryError::ForeignKeyViolation(msg) => ApiError::ReferenceViolation(msg),
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("工单日期窗口无效: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::NotFound {
            entity: "WorkOrder".to_string(),
            id: "WO001".to_string(),
        }
        .into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("WorkOrder"));
                assert!(msg.contains("WO001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError =
            RepositoryError::DuplicateClientRef("work_order.client_ref".to_string()).into();
        assert_eq!(api_err.code(), "CONFLICT");

        let api_err: ApiError =
            RepositoryError::ForeignKeyViolation("FOREIGN KEY constraint failed".to_string()).into();
        assert_eq!(api_err.code(), "REFERENCE_VIOLATION");

        let api_err: ApiError = RepositoryError::FieldValueError {
            field: "work_order_id".to_string(),
            message: "缺失".to_string(),
        }
        .into();
        assert_eq!(api_err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_date_range_error_code() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let api_err: ApiError = DateRangeError::Inverted { start, end }.into();
        assert_eq!(api_err.code(), "INVALID_DATE_RANGE");
    }
}
