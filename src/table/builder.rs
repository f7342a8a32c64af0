//! 通用表格 SQL 构建
//!
//! 把一份实体结构描述 + 列清单 + 请求参数编译成两条参数化 SQL:
//! 行查询和共享同一套过滤条件的计数查询。列名按四类处理: 标量列、
//! 一对一关系、一对多关系（只显示）、带 -input/-select 后缀的点号
//! 路径。每个关系路径前缀只建一次别名 LEFT JOIN，后续列复用。

use crate::config::TableConfig;
use crate::error::AppError;
use crate::schema::{ColumnDef, ColumnKind, EntitySchema, RelationDef, SchemaRegistry};
use crate::table::params::TableParams;
use uuid::Uuid;

/// 查询绑定值
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
}

/// 调用方追加的范围过滤（如 project_id 归属），始终 AND 进 WHERE
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    pub column: &'static str,
    pub value: BindValue,
}

/// 选择列的渲染方式，决定行渲染阶段如何取值和兜底
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// 文本化标量，NULL 显示为 "-"
    Text,
    /// description 列，剥 HTML 截断为预览，NULL 显示为 ""
    Description,
    /// 布尔，显示 Yes/No，NULL 显示为 "-"
    Boolean,
    /// 时间戳，长格式化，NULL 显示为 "-"
    DateTime,
    /// 关联对象的 title，未关联显示为 "-"
    RelatedTitle,
    /// 一对多预览串，空集合显示为 ""
    Joined,
    /// 点号路径终点值，NULL 显示为 ""
    PathValue,
}

/// 一个已编译的选择列
#[derive(Debug, Clone)]
pub struct SelectColumn {
    /// 请求中的原始列名，也是输出行里的键
    pub descriptor: String,
    /// SQL 里的输出别名 c0, c1, ...
    pub alias: String,
    pub output: OutputKind,
}

/// 构建结果: 行查询与计数查询，以及各自的绑定序列
#[derive(Debug)]
pub struct BuiltQuery {
    pub sql: String,
    pub count_sql: String,
    pub row_binds: Vec<BindValue>,
    pub count_binds: Vec<BindValue>,
    pub selects: Vec<SelectColumn>,
}

/// 点号路径列的匹配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMode {
    /// -input: 子串匹配
    Input,
    /// -select: 精确匹配
    Select,
}

/// 列名分类结果
enum ColumnClass {
    Scalar(&'static ColumnDef),
    ToOne(&'static RelationDef),
    ToMany(&'static RelationDef),
    Path { prefix: String, column: &'static ColumnDef, mode: PathMode },
}

pub struct TableQueryBuilder<'a> {
    registry: &'a SchemaRegistry,
    schema: &'static EntitySchema,
    cfg: &'a TableConfig,
    /// 关系路径前缀 -> 表别名，按首次出现顺序分配 a0, a1, ...
    aliases: Vec<(String, String)>,
    joins: Vec<String>,
}

impl<'a> TableQueryBuilder<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        schema: &'static EntitySchema,
        cfg: &'a TableConfig,
    ) -> Self {
        Self { registry, schema, cfg, aliases: Vec::new(), joins: Vec::new() }
    }

    /// 编译列清单 + 参数 + 范围过滤为行查询和计数查询
    pub fn build(
        mut self,
        columns: &[String],
        params: &TableParams,
        scope: &[ScopeFilter],
    ) -> Result<BuiltQuery, AppError> {
        let classes: Vec<(String, ColumnClass)> = columns
            .iter()
            .map(|c| Ok((c.clone(), self.classify(c)?)))
            .collect::<Result<_, AppError>>()?;

        // 先把所有列需要的 JOIN 建好，别名分配顺序只由列顺序决定
        for (_, class) in &classes {
            match class {
                ColumnClass::ToOne(rel) => {
                    self.ensure_alias(rel.name)?;
                }
                ColumnClass::Path { prefix, .. } => {
                    self.ensure_alias(prefix)?;
                }
                _ => {}
            }
        }

        let mut select_parts = vec!["t.id AS _row_id".to_string()];
        let mut select_binds: Vec<BindValue> = Vec::new();
        let mut selects = Vec::with_capacity(classes.len());

        for (i, (descriptor, class)) in classes.iter().enumerate() {
            let alias = format!("c{i}");
            let (expr, output) = match class {
                ColumnClass::Scalar(col) => match col.kind {
                    ColumnKind::Boolean => (format!("t.{}", col.name), OutputKind::Boolean),
                    ColumnKind::DateTime => (format!("t.{}", col.name), OutputKind::DateTime),
                    _ => {
                        let output = if col.name == "description" {
                            OutputKind::Description
                        } else {
                            OutputKind::Text
                        };
                        (format!("CAST(t.{} AS TEXT)", col.name), output)
                    }
                },
                ColumnClass::ToOne(rel) => {
                    let join_alias = self.alias_of(rel.name);
                    (format!("{join_alias}.title"), OutputKind::RelatedTitle)
                }
                ColumnClass::ToMany(rel) => {
                    let target = self.target_schema(rel)?;
                    select_binds.push(BindValue::Text(self.cfg.related_join_symbol.clone()));
                    let expr = format!(
                        "(SELECT string_agg(x.title, ?) FROM (SELECT {tt}.title AS title \
                         FROM {tt} WHERE {tt}.{fk} = t.id ORDER BY {tt}.title LIMIT {max}) x)",
                        tt = target.table,
                        fk = rel.fk_column,
                        max = self.cfg.related_max_items,
                    );
                    (expr, OutputKind::Joined)
                }
                ColumnClass::Path { prefix, column, .. } => {
                    let join_alias = self.alias_of(prefix);
                    (
                        format!("CAST({join_alias}.{} AS TEXT)", column.name),
                        OutputKind::PathValue,
                    )
                }
            };
            select_parts.push(format!("{expr} AS {alias}"));
            selects.push(SelectColumn { descriptor: descriptor.clone(), alias, output });
        }

        let mut where_parts: Vec<String> = Vec::new();
        let mut where_binds: Vec<BindValue> = Vec::new();

        for filter in scope {
            where_parts.push(format!("t.{} = ?", filter.column));
            where_binds.push(filter.value.clone());
        }

        // 空搜索串不产生任何条件，不会因 NULL 列排除行
        if !params.search.is_empty() {
            let pattern = format!("%{}%", params.search);
            let mut or_parts: Vec<String> = Vec::new();
            for (_, class) in &classes {
                let expr = match class {
                    ColumnClass::Scalar(col) => format!("CAST(t.{} AS TEXT) ILIKE ?", col.name),
                    ColumnClass::ToOne(rel) => {
                        format!("{}.title ILIKE ?", self.alias_of(rel.name))
                    }
                    ColumnClass::Path { prefix, column, .. } => {
                        format!("CAST({}.{} AS TEXT) ILIKE ?", self.alias_of(prefix), column.name)
                    }
                    // 一对多列只参与显示
                    ColumnClass::ToMany(_) => continue,
                };
                or_parts.push(expr);
                where_binds.push(BindValue::Text(pattern.clone()));
            }
            if !or_parts.is_empty() {
                where_parts.push(format!("({})", or_parts.join(" OR ")));
            }
        }

        for (key, raw) in &params.filter {
            let value = match raw {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let class = classes
                .iter()
                .find(|(descriptor, _)| descriptor == key)
                .map(|(_, class)| class)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Cannot filter on unknown column: {key}"))
                })?;
            match class {
                ColumnClass::Scalar(col) if col.kind == ColumnKind::Boolean => {
                    where_parts.push(format!("t.{} = ?", col.name));
                    where_binds.push(BindValue::Bool(value == "true"));
                }
                ColumnClass::Scalar(col) => {
                    where_parts.push(format!("CAST(t.{} AS TEXT) ILIKE ?", col.name));
                    where_binds.push(BindValue::Text(format!("%{value}%")));
                }
                ColumnClass::ToOne(rel) => {
                    // 关系过滤按外键精确匹配，非法 id 当作无过滤
                    if let Ok(id) = Uuid::parse_str(&value) {
                        where_parts.push(format!("t.{} = ?", rel.fk_column));
                        where_binds.push(BindValue::Uuid(id));
                    }
                }
                ColumnClass::ToMany(_) => {}
                ColumnClass::Path { prefix, column, mode } => {
                    let join_alias = self.alias_of(prefix);
                    match mode {
                        PathMode::Input => {
                            where_parts
                                .push(format!("CAST({join_alias}.{} AS TEXT) ILIKE ?", column.name));
                            where_binds.push(BindValue::Text(format!("%{value}%")));
                        }
                        PathMode::Select => {
                            where_parts
                                .push(format!("CAST({join_alias}.{} AS TEXT) = ?", column.name));
                            where_binds.push(BindValue::Text(value));
                        }
                    }
                }
            }
        }

        let mut order_parts: Vec<String> = Vec::new();
        for spec in &params.multi_sort {
            if let Some(expr) = self.sort_expression(&spec.name, &classes)? {
                order_parts.push(format!("{expr} {}", spec.order.as_sql()));
            }
        }
        if let Some(spec) = &params.sort {
            if let Some(expr) = self.sort_expression(&spec.name, &classes)? {
                order_parts.push(format!("{expr} {}", spec.order.as_sql()));
            }
        }
        // 恒定的末位排序键，保证分页顺序确定
        order_parts.push("t.id ASC".to_string());

        let join_clause = if self.joins.is_empty() {
            String::new()
        } else {
            format!(" {}", self.joins.join(" "))
        };
        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_parts.join(" AND "))
        };

        let mut sql = format!(
            "SELECT {} FROM {} t{}{} ORDER BY {}",
            select_parts.join(", "),
            self.schema.table,
            join_clause,
            where_clause,
            order_parts.join(", "),
        );
        if let Some(limit) = params.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = params.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let count_sql = format!(
            "SELECT COUNT(DISTINCT t.id) FROM {} t{}{}",
            self.schema.table, join_clause, where_clause,
        );

        let mut row_binds = select_binds;
        row_binds.extend(where_binds.iter().cloned());

        Ok(BuiltQuery {
            sql: number_placeholders(&sql),
            count_sql: number_placeholders(&count_sql),
            row_binds,
            count_binds: where_binds,
            selects,
        })
    }

    /// 把列名归入四类之一，解析失败即 400
    fn classify(&self, descriptor: &str) -> Result<ColumnClass, AppError> {
        if let Some(col) = self.schema.column(descriptor) {
            return Ok(ColumnClass::Scalar(col));
        }
        if let Some(rel) = self.schema.relation(descriptor) {
            return Ok(if rel.to_many {
                ColumnClass::ToMany(rel)
            } else {
                ColumnClass::ToOne(rel)
            });
        }

        let (path, mode) = match descriptor.rsplit_once('-') {
            Some((path, "input")) if path.contains('.') => (path, PathMode::Input),
            Some((path, "select")) if path.contains('.') => (path, PathMode::Select),
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Unknown column: {descriptor}"
                )))
            }
        };

        let mut segments: Vec<&str> = path.split('.').collect();
        let column_name = segments.pop().expect("path contains a dot");
        let mut current = self.schema;
        for segment in &segments {
            let rel = current.relation(segment).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown relation '{segment}' in column {descriptor}"
                ))
            })?;
            if rel.to_many {
                return Err(AppError::BadRequest(format!(
                    "Column {descriptor} traverses a collection relation"
                )));
            }
            current = self.target_schema(rel)?;
        }
        let column = current.column(column_name).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown column '{column_name}' in {descriptor}"
            ))
        })?;

        Ok(ColumnClass::Path { prefix: segments.join("."), column, mode })
    }

    /// 为关系路径前缀分配别名并生成 LEFT JOIN 链，重复调用幂等
    fn ensure_alias(&mut self, prefix: &str) -> Result<String, AppError> {
        if let Some(existing) = self.lookup_alias(prefix) {
            return Ok(existing);
        }

        let mut current = self.schema;
        let mut parent_alias = "t".to_string();
        let mut walked = String::new();
        for segment in prefix.split('.') {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let rel = current.relation(segment).ok_or_else(|| {
                AppError::Internal(format!(
                    "Relation path '{prefix}' does not resolve on {}",
                    self.schema.entity
                ))
            })?;
            let target = self.target_schema(rel)?;

            let alias = match self.lookup_alias(&walked) {
                Some(alias) => alias,
                None => {
                    let alias = format!("a{}", self.aliases.len());
                    self.joins.push(format!(
                        "LEFT JOIN {} {} ON {}.id = {}.{}",
                        target.table, alias, alias, parent_alias, rel.fk_column
                    ));
                    self.aliases.push((walked.clone(), alias.clone()));
                    alias
                }
            };
            parent_alias = alias;
            current = target;
        }
        Ok(parent_alias)
    }

    fn lookup_alias(&self, prefix: &str) -> Option<String> {
        self.aliases
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, a)| a.clone())
    }

    /// 前置条件: ensure_alias 已为该前缀建过 JOIN
    fn alias_of(&self, prefix: &str) -> String {
        self.lookup_alias(prefix).unwrap_or_else(|| "t".to_string())
    }

    fn target_schema(&self, rel: &RelationDef) -> Result<&'static EntitySchema, AppError> {
        self.registry.get(rel.target).ok_or_else(|| {
            AppError::Internal(format!("Relation target '{}' is not registered", rel.target))
        })
    }

    /// 排序键对应的 SQL 表达式。一对多列不可排序，返回 None。
    fn sort_expression(
        &mut self,
        name: &str,
        classes: &[(String, ColumnClass)],
    ) -> Result<Option<String>, AppError> {
        let resolved;
        let class = match classes.iter().find(|(descriptor, _)| descriptor == name) {
            Some((_, class)) => class,
            // 排序键不在列清单里时独立解析，需要的 JOIN 现建
            None => {
                resolved = self.classify(name)?;
                &resolved
            }
        };
        Ok(match class {
            ColumnClass::Scalar(col) => Some(format!("t.{}", col.name)),
            ColumnClass::ToOne(rel) => {
                let alias = self.ensure_alias(rel.name)?;
                Some(format!("{alias}.title"))
            }
            ColumnClass::ToMany(_) => None,
            ColumnClass::Path { prefix, column, .. } => {
                let alias = self.ensure_alias(prefix)?;
                Some(format!("{alias}.{}", column.name))
            }
        })
    }
}

/// 把 `?` 占位符按出现顺序改写成 Postgres 的 `$1..$n`
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut index = 0;
    for ch in sql.chars() {
        if ch == '?' {
            index += 1;
            out.push_str(&format!("${index}"));
        } else {
            out.push(ch);
        }
    }
    out
}
