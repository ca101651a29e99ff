// ==========================================
// 制造运营管理系统 - 主生产计划（MPS）条目
// ==========================================
// 只读引用实体: 工单流程从不修改，只被明细行引用
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    #[serde(rename = "mpsID")]
    pub mps_id: String,              // 主生产计划ID
    #[serde(default)]
    pub product_name: String,        // 产品名称
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
    #[serde(default)]
    pub quantity: i64,               // 计划数量
}

impl ScheduleItem {
    pub fn new(mps_id: impl Into<String>, product_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            mps_id: mps_id.into(),
            product_name: product_name.into(),
            date_start: None,
            date_end: None,
            quantity,
        }
    }

    pub fn with_window(mut self, date_start: NaiveDate, date_end: NaiveDate) -> Self {
        self.date_start = Some(date_start);
        self.date_end = Some(date_end);
        self
    }
}
