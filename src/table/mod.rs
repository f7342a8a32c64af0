//! 通用 bootstrap-table 数据管线
//!
//! 参数解析（params）、SQL 构建（builder）、行渲染（render）和这里的
//! 执行编排。所有列表端点共用同一条路径: 解析参数 -> 编译两条查询 ->
//! 执行 -> 渲染 -> 合成列 -> `{"total", "rows"}`。

pub mod builder;
pub mod params;
pub mod render;

pub use builder::{BindValue, BuiltQuery, OutputKind, ScopeFilter, TableQueryBuilder};
pub use params::{SortOrder, SortSpec, TableParams};

use crate::config::TableConfig;
use crate::error::AppError;
use crate::schema::{EntitySchema, SchemaRegistry};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// 渲染后追加的合成列: (列名, 基于已渲染行计算值的函数)
pub type Synthesizer = Box<dyn Fn(&serde_json::Map<String, Value>) -> Value + Send + Sync>;

/// 列表端点的响应体
#[derive(Debug, Serialize)]
pub struct TableData {
    /// 过滤后的总行数（分页前）
    pub total: i64,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

/// 执行一次完整的表格查询
#[allow(clippy::too_many_arguments)]
pub async fn fetch_table_data(
    pool: &PgPool,
    registry: &SchemaRegistry,
    cfg: &TableConfig,
    schema: &'static EntitySchema,
    columns: &[String],
    params: &TableParams,
    scope: &[ScopeFilter],
    synthesizers: &[(String, Synthesizer)],
) -> Result<TableData, AppError> {
    let built = TableQueryBuilder::new(registry, schema, cfg).build(columns, params, scope)?;

    let mut count_query = sqlx::query_scalar::<_, i64>(&built.count_sql);
    for bind in &built.count_binds {
        count_query = match bind {
            BindValue::Text(v) => count_query.bind(v.as_str()),
            BindValue::Int(v) => count_query.bind(*v),
            BindValue::Bool(v) => count_query.bind(*v),
            BindValue::Uuid(v) => count_query.bind(*v),
        };
    }
    let total = count_query.fetch_one(pool).await?;

    let mut row_query = sqlx::query(&built.sql);
    for bind in &built.row_binds {
        row_query = match bind {
            BindValue::Text(v) => row_query.bind(v.as_str()),
            BindValue::Int(v) => row_query.bind(*v),
            BindValue::Bool(v) => row_query.bind(*v),
            BindValue::Uuid(v) => row_query.bind(*v),
        };
    }
    let raw_rows = row_query.fetch_all(pool).await?;

    let mut rows = Vec::with_capacity(raw_rows.len());
    for raw in raw_rows {
        let mut rendered = serde_json::Map::new();
        let id: Uuid = raw.try_get("_row_id")?;
        rendered.insert("_id".to_string(), Value::String(id.to_string()));

        for sel in &built.selects {
            let alias = sel.alias.as_str();
            let cell = match sel.output {
                OutputKind::Text => render::text_cell(raw.try_get(alias)?),
                OutputKind::Description => {
                    render::description_cell(raw.try_get(alias)?, cfg.description_preview_words)
                }
                OutputKind::Boolean => render::boolean_cell(raw.try_get(alias)?),
                OutputKind::DateTime => render::datetime_cell(raw.try_get(alias)?),
                OutputKind::RelatedTitle => render::related_cell(raw.try_get(alias)?),
                OutputKind::Joined => render::joined_cell(raw.try_get(alias)?),
                OutputKind::PathValue => render::path_cell(raw.try_get(alias)?),
            };
            rendered.insert(sel.descriptor.clone(), cell);
        }

        for (name, synthesize) in synthesizers {
            let value = synthesize(&rendered);
            rendered.insert(name.clone(), value);
        }

        rows.push(rendered);
    }

    Ok(TableData { total, rows })
}
