//! Bootstrap-table 请求参数解析
//!
//! 统一的 search/sort/order/offset/limit/filter/multiSort 查询参数约定。
//! 所有畸形输入在这里以 400 拒绝，查询构建阶段不再做参数校验。

use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(AppError::BadRequest(format!(
                "Invalid sort order: {other}"
            ))),
        }
    }
}

/// 一条排序指令
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub name: String,
    pub order: SortOrder,
}

/// 解析后的表格请求参数
#[derive(Debug, Clone, Default)]
pub struct TableParams {
    /// 自由文本搜索，空串等价于未搜索
    pub search: String,
    /// 单列排序（sort + order 同时给出时生效）
    pub sort: Option<SortSpec>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// 按列的精确/子串过滤，JSON 对象
    pub filter: serde_json::Map<String, Value>,
    /// 多列排序，优先于单列排序
    pub multi_sort: Vec<SortSpec>,
}

// multiSort[3][sortName] / multiSort[3][sortOrder]
static MULTI_SORT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^multiSort\[(\d+)\]\[sort(Name|Order)\]$").expect("static regex"));

impl TableParams {
    /// 从原始查询参数对解析
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let get = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        let search = get("search").unwrap_or("").to_string();

        let order = get("order").map(SortOrder::parse).transpose()?;
        let sort = match (get("sort"), order) {
            (Some(name), Some(order)) => Some(SortSpec { name: name.to_string(), order }),
            _ => None,
        };

        let offset = Self::parse_int(get("offset"), "offset")?;
        let limit = Self::parse_int(get("limit"), "limit")?;

        let filter = match get("filter") {
            None => serde_json::Map::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(AppError::BadRequest(
                        "filter must be a JSON object".to_string(),
                    ))
                }
            },
        };

        let multi_sort = Self::parse_multi_sort(pairs)?;

        Ok(Self { search, sort, offset, limit, filter, multi_sort })
    }

    fn parse_int(value: Option<&str>, name: &str) -> Result<Option<i64>, AppError> {
        match value {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("{name} must be an integer"))),
        }
    }

    /// 重组 multiSort[i][sortName]/multiSort[i][sortOrder] 参数组。
    /// 括号索引或键名畸形、条目缺少 name/order 都是 400，不静默跳过。
    fn parse_multi_sort(pairs: &[(String, String)]) -> Result<Vec<SortSpec>, AppError> {
        let mut collected: BTreeMap<u64, (Option<String>, Option<SortOrder>)> = BTreeMap::new();

        for (key, value) in pairs {
            if !key.starts_with("multiSort") {
                continue;
            }
            let caps = MULTI_SORT_KEY.captures(key).ok_or_else(|| {
                AppError::BadRequest(format!("Malformed multiSort parameter: {key}"))
            })?;
            let index: u64 = caps[1]
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Malformed multiSort index in {key}")))?;

            let entry = collected.entry(index).or_default();
            match &caps[2] {
                "Name" => entry.0 = Some(value.clone()),
                _ => entry.1 = Some(SortOrder::parse(value)?),
            }
        }

        let mut result = Vec::with_capacity(collected.len());
        for (index, (name, order)) in collected {
            match (name, order) {
                (Some(name), Some(order)) => result.push(SortSpec { name, order }),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "multiSort[{index}] is missing sortName or sortOrder"
                    )))
                }
            }
        }
        Ok(result)
    }
}
