//! 行渲染: 把查询结果的原始值转成表格单元格显示值

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// 剥掉 HTML 标签、压缩空白并按单词数截断为预览串
pub fn html_preview(html: &str, max_words: usize) -> String {
    let stripped = HTML_TAG.replace_all(html, " ");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    let words: Vec<&str> = collapsed.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        format!("{}...", words[..max_words].join(" "))
    }
}

/// 列表时间戳的长格式，如 "Monday, August 25, 2025 3:04 PM"
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%A, %B %-d, %Y %-I:%M %p").to_string()
}

/// 标量文本，NULL 显示 "-"
pub fn text_cell(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_else(|| "-".to_string()))
}

/// description 预览，NULL 显示空串
pub fn description_cell(value: Option<String>, max_words: usize) -> Value {
    Value::String(
        value
            .map(|v| html_preview(&v, max_words))
            .unwrap_or_default(),
    )
}

pub fn boolean_cell(value: Option<bool>) -> Value {
    Value::String(match value {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => "-".to_string(),
    })
}

pub fn datetime_cell(value: Option<DateTime<Utc>>) -> Value {
    Value::String(
        value
            .map(|v| format_timestamp(&v))
            .unwrap_or_else(|| "-".to_string()),
    )
}

/// 关联对象 title，未关联显示 "-"
pub fn related_cell(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_else(|| "-".to_string()))
}

/// 一对多预览串，空集合显示空串
pub fn joined_cell(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_default())
}

/// 点号路径终点值，路径上任一环节缺失显示空串
pub fn path_cell(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_default())
}
