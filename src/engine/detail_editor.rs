// ==========================================
// 制造运营管理系统 - 工单明细编辑器
// ==========================================
// 职责: 持有有序的明细草稿集合
// - add_draft: 追加空白行（无上限）
// - assign_schedule_reference: 关联主生产计划（最后一行 / 指定行）
// - edit_field: 修改单个字段
// 红线: 不访问网络；越界/非法取值返回错误且不修改集合
// ==========================================

use crate::domain::types::DetailField;
use crate::domain::work_order::{DetailKey, WorkOrderDetail};
use crate::engine::error::EditorError;

#[derive(Debug, Clone, Default)]
pub struct DetailListEditor {
    rows: Vec<WorkOrderDetail>,
    next_key: u64,
}

impl DetailListEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条空白明细，返回其稳定键
    pub fn add_draft(&mut self) -> DetailKey {
        self.next_key += 1;
        let key = DetailKey(self.next_key);
        self.rows.push(WorkOrderDetail::draft(key));
        tracing::debug!(key = %key, rows = self.rows.len(), "新增明细草稿");
        key
    }

    /// 将主生产计划关联到调用时的最后一行
    pub fn assign_schedule_reference(&mut self, mps_id: &str) -> Result<DetailKey, EditorError> {
        let row = self.rows.last_mut().ok_or(EditorError::NoDraftRows)?;
        row.master_production_schedule_id = Some(mps_id.to_string());
        Ok(row.key)
    }

    /// 将主生产计划关联到指定行
    pub fn assign_schedule_reference_to(
        &mut self,
        key: DetailKey,
        mps_id: &str,
    ) -> Result<(), EditorError> {
        let index = self.index_of(key).ok_or(EditorError::UnknownKey(key))?;
        self.rows[index].master_production_schedule_id = Some(mps_id.to_string());
        Ok(())
    }

    /// 修改指定行的单个字段
    ///
    /// # 取值规则
    /// - 数量类: 空串视为 0；必须为非负整数
    /// - 价格类: 空串视为 0；必须为非负有限小数
    /// - 备注: 原样保存
    pub fn edit_field(
        &mut self,
        index: usize,
        field: DetailField,
        value: &str,
    ) -> Result<(), EditorError> {
        let len = self.rows.len();
        if index >= len {
            tracing::warn!(index, len, field = %field, "明细编辑越界，已忽略");
            return Err(EditorError::IndexOutOfRange { index, len });
        }

        // 先解析，再赋值
        let parsed = FieldValue::parse(field, value)?;
        parsed.apply(&mut self.rows[index]);
        Ok(())
    }

    /// 按字段名修改（接受 camelCase / snake_case）
    pub fn edit_field_by_name(
        &mut self,
        index: usize,
        field_name: &str,
        value: &str,
    ) -> Result<(), EditorError> {
        let field = DetailField::parse(field_name)
            .ok_or_else(|| EditorError::UnknownField(field_name.to_string()))?;
        self.edit_field(index, field, value)
    }

    /// 按稳定键修改
    pub fn edit_field_by_key(
        &mut self,
        key: DetailKey,
        field: DetailField,
        value: &str,
    ) -> Result<(), EditorError> {
        let index = self.index_of(key).ok_or(EditorError::UnknownKey(key))?;
        self.edit_field(index, field, value)
    }

    pub fn rows(&self) -> &[WorkOrderDetail] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_of(&self, key: DetailKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    /// 按集合顺序为每一行盖上父工单ID（不论行是否填写完整），返回盖章后的副本
    pub fn stamp_parent(&mut self, work_order_id: &str) -> Vec<WorkOrderDetail> {
        for row in self.rows.iter_mut() {
            row.stamp(work_order_id);
        }
        self.rows.clone()
    }

    /// 交出全部草稿（工作流结束时）
    pub fn into_rows(self) -> Vec<WorkOrderDetail> {
        self.rows
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

// ==========================================
// FieldValue - 已解析的字段取值
// ==========================================
enum FieldValue {
    Text(DetailField, String),
    Quantity(DetailField, i64),
    Price(DetailField, f64),
}

impl FieldValue {
    fn parse(field: DetailField, raw: &str) -> Result<Self, EditorError> {
        let invalid = || EditorError::InvalidFieldValue {
            field: field.wire_name().to_string(),
            value: raw.to_string(),
        };

        if field.is_quantity() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Quantity(field, 0));
            }
            let value = trimmed.parse::<i64>().map_err(|_| invalid())?;
            if value < 0 {
                return Err(invalid());
            }
            Ok(FieldValue::Quantity(field, value))
        } else if field.is_price() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Price(field, 0.0));
            }
            let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            Ok(FieldValue::Price(field, value))
        } else {
            Ok(FieldValue::Text(field, raw.to_string()))
        }
    }

    fn apply(self, row: &mut WorkOrderDetail) {
        match self {
            FieldValue::Text(_, text) => row.note = text,
            FieldValue::Quantity(DetailField::ProjectedProduction, v) => row.projected_production = v,
            FieldValue::Quantity(DetailField::ActualProduction, v) => row.actual_production = v,
            FieldValue::Quantity(_, v) => row.faulty_products = v,
            FieldValue::Price(DetailField::ActualProductionPrice, v) => row.actual_production_price = v,
            FieldValue::Price(_, v) => row.faulty_product_price = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_draft_preserves_call_order() {
        let mut editor = DetailListEditor::new();
        let keys: Vec<DetailKey> = (0..5).map(|_| editor.add_draft()).collect();

        assert_eq!(editor.len(), 5);
        for (row, key) in editor.rows().iter().zip(&keys) {
            assert_eq!(row.key, *key);
            assert!(!row.has_schedule_reference());
            assert!(row.note.is_empty());
            assert!(row.work_order_id.is_none());
        }
    }

    #[test]
    fn test_assign_targets_last_row_at_call_time() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();
        let second = editor.add_draft();

        assert_eq!(editor.assign_schedule_reference("A").unwrap(), second);
        let third = editor.add_draft();
        assert_eq!(editor.assign_schedule_reference("B").unwrap(), third);

        let refs: Vec<Option<&str>> = editor
            .rows()
            .iter()
            .map(|r| r.master_production_schedule_id.as_deref())
            .collect();
        assert_eq!(refs, vec![None, Some("A"), Some("B")]);
    }

    #[test]
    fn test_assign_on_empty_editor_fails() {
        let mut editor = DetailListEditor::new();
        assert_eq!(
            editor.assign_schedule_reference("A").unwrap_err(),
            EditorError::NoDraftRows
        );
        assert!(editor.is_empty());
    }

    #[test]
    fn test_assign_by_key() {
        let mut editor = DetailListEditor::new();
        let first = editor.add_draft();
        editor.add_draft();

        editor.assign_schedule_reference_to(first, "A").unwrap();
        assert_eq!(
            editor.rows()[0].master_production_schedule_id.as_deref(),
            Some("A")
        );
        assert!(editor.rows()[1].master_production_schedule_id.is_none());

        let err = editor
            .assign_schedule_reference_to(DetailKey(99), "A")
            .unwrap_err();
        assert_eq!(err, EditorError::UnknownKey(DetailKey(99)));
    }

    #[test]
    fn test_out_of_range_edit_leaves_rows_intact() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();
        editor.edit_field(0, DetailField::Note, "first").unwrap();
        let before = editor.rows().to_vec();

        let err = editor.edit_field(3, DetailField::Note, "x").unwrap_err();
        assert_eq!(err, EditorError::IndexOutOfRange { index: 3, len: 1 });
        assert_eq!(editor.rows(), before.as_slice());

        let mut empty = DetailListEditor::new();
        assert!(empty.edit_field(0, DetailField::Note, "x").is_err());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_edit_field_parsing() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();

        editor.edit_field(0, DetailField::ProjectedProduction, " 120 ").unwrap();
        editor.edit_field(0, DetailField::ActualProduction, "100").unwrap();
        editor.edit_field(0, DetailField::FaultyProducts, "").unwrap();
        editor.edit_field(0, DetailField::ActualProductionPrice, "12.5").unwrap();
        editor.edit_field(0, DetailField::FaultyProductPrice, "0.75").unwrap();

        let row = &editor.rows()[0];
        assert_eq!(row.projected_production, 120);
        assert_eq!(row.actual_production, 100);
        assert_eq!(row.faulty_products, 0);
        assert_eq!(row.actual_production_price, 12.5);
        assert_eq!(row.faulty_product_price, 0.75);
    }

    #[test]
    fn test_invalid_values_rejected_without_mutation() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();
        editor.edit_field(0, DetailField::ActualProduction, "7").unwrap();

        for bad in ["abc", "-1", "1.5"] {
            let err = editor
                .edit_field(0, DetailField::ActualProduction, bad)
                .unwrap_err();
            assert!(matches!(err, EditorError::InvalidFieldValue { .. }));
        }
        for bad in ["NaN", "inf", "-0.5"] {
            assert!(editor
                .edit_field(0, DetailField::FaultyProductPrice, bad)
                .is_err());
        }

        assert_eq!(editor.rows()[0].actual_production, 7);
        assert_eq!(editor.rows()[0].faulty_product_price, 0.0);
    }

    #[test]
    fn test_edit_by_name_and_key() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();
        let second = editor.add_draft();

        editor.edit_field_by_name(1, "faultyProducts", "3").unwrap();
        editor
            .edit_field_by_key(second, DetailField::Note, "night shift")
            .unwrap();
        assert_eq!(editor.rows()[1].faulty_products, 3);
        assert_eq!(editor.rows()[1].note, "night shift");

        assert_eq!(
            editor.edit_field_by_name(0, "workOrderId", "x").unwrap_err(),
            EditorError::UnknownField("workOrderId".to_string())
        );
    }

    #[test]
    fn test_stamp_parent_stamps_every_row() {
        let mut editor = DetailListEditor::new();
        editor.add_draft();
        editor.add_draft();
        editor.assign_schedule_reference("A").unwrap();

        let stamped = editor.stamp_parent("WO-1");
        assert_eq!(stamped.len(), 2);
        assert!(stamped
            .iter()
            .all(|r| r.work_order_id.as_deref() == Some("WO-1")));
        assert_eq!(editor.rows(), stamped.as_slice());
    }
}
