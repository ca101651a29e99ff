// ==========================================
// 制造运营管理系统 - 工单日期范围校验
// ==========================================
// 规则: 开始日期 <= 结束日期（按天比较）
// - 拒绝时两端日期均保持不变，并发出 danger 通知
// 时区: 日期为工厂日历日（NaiveDate），时刻按配置的固定偏移折算
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::domain::work_order::{DateRangeError, WorkOrder};
use crate::engine::notification::{Notification, NotificationSink};

/// 将时刻折算为工厂日历日
pub fn to_plant_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

pub struct DateRangeValidator {
    notifier: Arc<dyn NotificationSink>,
}

impl DateRangeValidator {
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self { notifier }
    }

    /// 提议新的开始日期
    pub fn apply_start(
        &self,
        work_order: &mut WorkOrder,
        proposed: NaiveDate,
    ) -> Result<(), DateRangeError> {
        work_order
            .try_set_date_start(proposed)
            .map_err(|e| self.report(e))
    }

    /// 提议新的结束日期
    pub fn apply_end(
        &self,
        work_order: &mut WorkOrder,
        proposed: NaiveDate,
    ) -> Result<(), DateRangeError> {
        work_order
            .try_set_date_end(proposed)
            .map_err(|e| self.report(e))
    }

    fn report(&self, err: DateRangeError) -> DateRangeError {
        tracing::info!(error = %err, "日期修改被拒绝");

        let notification = match &err {
            DateRangeError::StartAfterEnd {
                proposed,
                current_end,
            } => {
                let (proposed, current) = (proposed.to_string(), current_end.to_string());
                Notification::danger_with(
                    "work_order.notify.start_after_end",
                    &[("proposed", proposed.as_str()), ("current", current.as_str())],
                )
            }
            DateRangeError::EndBeforeStart {
                proposed,
                current_start,
            } => {
                let (proposed, current) = (proposed.to_string(), current_start.to_string());
                Notification::danger_with(
                    "work_order.notify.end_before_start",
                    &[("proposed", proposed.as_str()), ("current", current.as_str())],
                )
            }
            DateRangeError::Inverted { .. } => Notification::danger(err.to_string()),
        };
        self.notifier.show(notification);

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::NotificationKind;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<Notification>>);

    impl NotificationSink for CollectingSink {
        fn show(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> (Arc<CollectingSink>, DateRangeValidator, WorkOrder) {
        let sink = Arc::new(CollectingSink::default());
        let validator = DateRangeValidator::new(sink.clone());
        let wo = WorkOrder::new_draft("PM001", d(2024, 1, 10));
        (sink, validator, wo)
    }

    #[test]
    fn test_end_before_start_rejected_with_danger() {
        let (sink, validator, mut wo) = setup();

        let err = validator.apply_end(&mut wo, d(2024, 1, 5)).unwrap_err();
        assert!(matches!(err, DateRangeError::EndBeforeStart { .. }));
        assert_eq!(wo.date_end(), d(2024, 1, 10));
        assert_eq!(wo.date_start(), d(2024, 1, 10));

        let shown = sink.0.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, NotificationKind::Danger);
        assert!(shown[0].description.contains("2024-01-05"));
    }

    #[test]
    fn test_acceptance_matches_ordering_predicate() {
        let (sink, validator, mut wo) = setup();

        // 相等允许
        validator.apply_start(&mut wo, d(2024, 1, 10)).unwrap();
        validator.apply_end(&mut wo, d(2024, 1, 20)).unwrap();
        validator.apply_start(&mut wo, d(2024, 1, 20)).unwrap();
        assert!(validator.apply_start(&mut wo, d(2024, 1, 21)).is_err());
        validator.apply_start(&mut wo, d(2024, 1, 1)).unwrap();
        assert!(validator.apply_end(&mut wo, d(2023, 12, 31)).is_err());

        assert_eq!(wo.date_start(), d(2024, 1, 1));
        assert_eq!(wo.date_end(), d(2024, 1, 20));
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_to_plant_day_uses_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 9, 20, 30, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();

        assert_eq!(to_plant_day(instant, utc), d(2024, 1, 9));
        assert_eq!(to_plant_day(instant, shanghai), d(2024, 1, 10));
        assert_eq!(to_plant_day(instant, new_york), d(2024, 1, 9));
    }
}
