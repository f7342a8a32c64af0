//! 实体结构描述注册表
//!
//! 每个参与通用表格查询或权限检查的实体在这里静态声明一份描述:
//! 标量列及其类型、一对一/一对多关系、默认显示列、以及该实体类上
//! 注册的动作集合。注册表在启动时构建并校验一次，之后只读。

pub mod entities;

use crate::error::AppError;

/// 标量列的类型，决定查询中的匹配方式和行渲染方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    DateTime,
    Uuid,
}

/// 标量列描述
#[derive(Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// 关系描述
///
/// 一对一关系通过本表的外键列连接目标实体; 一对多关系通过目标表
/// 指回本表的外键列连接，只参与显示，不参与搜索和过滤。
#[derive(Debug)]
pub struct RelationDef {
    pub name: &'static str,
    /// 目标实体名（注册表中的键）
    pub target: &'static str,
    /// 一对一: 本表的外键列; 一对多: 目标表指回本表的外键列
    pub fk_column: &'static str,
    pub to_many: bool,
}

/// 动作描述: (动作名, 显示标签)
pub type ActionDef = (&'static str, &'static str);

/// 实体结构描述
#[derive(Debug)]
pub struct EntitySchema {
    /// 实体类名，同时是授权记录里的 object_class_name
    pub entity: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
    /// 表格请求未显式给出列清单时使用的默认列
    pub default_columns: &'static [&'static str],
    /// 项目范围内允许检查的动作集合（空表示实体不参与项目权限）
    pub project_actions: &'static [ActionDef],
    /// 全局（职位）范围内允许检查的动作集合
    pub global_actions: &'static [ActionDef],
}

impl EntitySchema {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn has_project_action(&self, action: &str) -> bool {
        self.project_actions.iter().any(|(a, _)| *a == action)
    }

    pub fn has_global_action(&self, action: &str) -> bool {
        self.global_actions.iter().any(|(a, _)| *a == action)
    }
}

/// 进程级结构注册表
///
/// 启动时由 [`SchemaRegistry::builtin`] 一次性构建并通过 [`validate`]
/// 校验，随后以 `Arc` 形式挂在应用状态上，只读使用。
///
/// [`validate`]: SchemaRegistry::validate
pub struct SchemaRegistry {
    entries: Vec<&'static EntitySchema>,
}

impl SchemaRegistry {
    /// 构建包含全部内置实体的注册表
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                &entities::PROJECT,
                &entities::NETWORK,
                &entities::HOST,
                &entities::SERVICE,
                &entities::ISSUE,
                &entities::ISSUE_STATUS,
                &entities::ISSUE_PRIORITY,
                &entities::USER,
            ],
        }
    }

    pub fn get(&self, entity: &str) -> Option<&'static EntitySchema> {
        self.entries.iter().find(|s| s.entity == entity).copied()
    }

    pub fn all(&self) -> &[&'static EntitySchema] {
        &self.entries
    }

    /// 参与项目权限矩阵的实体
    pub fn project_scoped(&self) -> impl Iterator<Item = &'static EntitySchema> + '_ {
        self.entries
            .iter()
            .copied()
            .filter(|s| !s.project_actions.is_empty())
    }

    /// 参与全局权限矩阵的实体
    pub fn global_scoped(&self) -> impl Iterator<Item = &'static EntitySchema> + '_ {
        self.entries
            .iter()
            .copied()
            .filter(|s| !s.global_actions.is_empty())
    }

    /// 启动时校验: 每个关系的目标实体必须已注册，默认列必须可解析
    pub fn validate(&self) -> Result<(), AppError> {
        for schema in &self.entries {
            for rel in schema.relations {
                if self.get(rel.target).is_none() {
                    return Err(AppError::Config(format!(
                        "Relation '{}' on entity {} references unknown entity {}",
                        rel.name, schema.entity, rel.target
                    )));
                }
            }
            for col in schema.default_columns {
                let base = col.split('-').next().unwrap_or(col);
                let head = base.split('.').next().unwrap_or(base);
                if schema.column(head).is_none() && schema.relation(head).is_none() {
                    return Err(AppError::Config(format!(
                        "Default column '{}' on entity {} does not resolve",
                        col, schema.entity
                    )));
                }
            }
        }
        Ok(())
    }
}
