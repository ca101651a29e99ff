// ==========================================
// 制造运营管理系统 - 主生产计划 CSV 导入
// ==========================================
// 表头: mps_id, product_name, date_start, date_end, quantity
//       （同时接受 mpsID / productName / dateStart / dateEnd）
// 日期: YYYY-MM-DD，可为空
// 规则: 整批解析通过后才写入；写入为单事务，任一行解析或写入失败则整批不落库
// ==========================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::api::WorkOrderApi;
use crate::domain::schedule::ScheduleItem;
use crate::importer::error::{ImportError, ImportResult};

#[derive(Debug, Deserialize)]
struct RawScheduleRow {
    #[serde(alias = "mpsID")]
    mps_id: String,
    #[serde(default, alias = "productName")]
    product_name: String,
    #[serde(default, alias = "dateStart")]
    date_start: String,
    #[serde(default, alias = "dateEnd")]
    date_end: String,
    #[serde(default)]
    quantity: String,
}

/// 导入汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped_blank: usize,
}

pub struct ScheduleCsvImporter;

impl ScheduleCsvImporter {
    /// 解析 CSV 文件
    pub fn parse_file(path: &Path) -> ImportResult<(Vec<ScheduleItem>, ImportSummary)> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        Self::parse_reader(file)
    }

    /// 从任意 reader 解析
    pub fn parse_reader<R: Read>(reader: R) -> ImportResult<(Vec<ScheduleItem>, ImportSummary)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut items = Vec::new();
        let mut summary = ImportSummary::default();

        for (idx, result) in reader.deserialize::<RawScheduleRow>().enumerate() {
            // 行号从 2 开始（第 1 行为表头）
            let row_no = idx + 2;
            let raw = result?;
            summary.total_rows += 1;

            if raw.mps_id.is_empty() {
                if raw.product_name.is_empty() && raw.quantity.is_empty() {
                    summary.skipped_blank += 1;
                    continue;
                }
                return Err(ImportError::PrimaryKeyMissing(row_no));
            }

            items.push(Self::map_row(row_no, raw)?);
        }

        Ok((items, summary))
    }

    fn map_row(row_no: usize, raw: RawScheduleRow) -> ImportResult<ScheduleItem> {
        let date_start = parse_optional_date(row_no, "date_start", &raw.date_start)?;
        let date_end = parse_optional_date(row_no, "date_end", &raw.date_end)?;

        if let (Some(start), Some(end)) = (date_start, date_end) {
            if start > end {
                return Err(ImportError::ValueError {
                    row: row_no,
                    field: "date_end".to_string(),
                    message: format!("结束日期 {} 早于开始日期 {}", end, start),
                });
            }
        }

        let quantity = if raw.quantity.is_empty() {
            0
        } else {
            raw.quantity
                .parse::<i64>()
                .map_err(|e| ImportError::ValueError {
                    row: row_no,
                    field: "quantity".to_string(),
                    message: e.to_string(),
                })?
        };
        if quantity < 0 {
            return Err(ImportError::ValueError {
                row: row_no,
                field: "quantity".to_string(),
                message: format!("数量不能为负: {}", quantity),
            });
        }

        Ok(ScheduleItem {
            mps_id: raw.mps_id,
            product_name: raw.product_name,
            date_start,
            date_end,
            quantity,
        })
    }

    /// 写入存储（单事务）
    pub fn import(api: &WorkOrderApi, items: &[ScheduleItem]) -> ImportResult<usize> {
        let count = api
            .upsert_schedule_items(items)
            .map_err(ImportError::StoreError)?;

        tracing::info!(count, "主生产计划导入完成");
        Ok(count)
    }
}

fn parse_optional_date(row: usize, field: &str, value: &str) -> ImportResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ImportError::DateFormatError {
            row,
            field: field.to_string(),
            value: value.to_string(),
        })
}
