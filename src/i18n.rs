// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 通知文案（保存结果 / 日期校验 / 目录加载）按当前语言渲染
// 语言: zh-CN（默认）、en；环境变量 MES_LOCALE 可覆盖
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

const LOCALE_ENV: &str = "MES_LOCALE";

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言；不支持的语言记 warn 并保持不变
///
/// # 返回
/// - true: 已切换
pub fn set_locale(locale: &str) -> bool {
    let locale = locale.trim();
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的语言，保持当前语言");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 按 MES_LOCALE 初始化语言（未设置时保持默认）
pub fn init_from_env() {
    if let Ok(locale) = std::env::var(LOCALE_ENV) {
        if set_locale(&locale) {
            tracing::debug!(locale = %locale.trim(), "通知语言已设置");
        }
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use mes_work_order::i18n::t;
/// let title = t("work_order.notify.success_title");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息，替换 `%{name}` 占位符
///
/// # 示例
/// ```no_run
/// use mes_work_order::i18n::t_with_args;
/// let msg = t_with_args("work_order.notify.phase1_failed", &[("reason", "timeout")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}
