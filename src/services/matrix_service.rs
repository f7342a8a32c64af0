//! 权限矩阵与动态表单服务
//!
//! 矩阵页面的每个格子对应一条授权记录，记录按 (拥有者, 类, 动作)
//! 惰性补齐: 首次渲染时用 ON CONFLICT DO NOTHING 落行，并发渲染也
//! 只会落一行。提交走结构化键，"____" 分隔的字符串只是线上格式，
//! 进了进程边界立即解析回 [`GrantKey`]。

use crate::{
    error::AppError,
    models::project::ProjectFieldValue,
    repository::{
        project_repo::ProjectRepository, role_repo::RoleRepository, user_repo::UserRepository,
    },
    schema::SchemaRegistry,
};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// 表单字段名的线上分隔符
pub const WIRE_SEPARATOR: &str = "____";

/// 授权记录的拥有者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOwner {
    Role(Uuid),
    Position(Uuid),
}

/// 一条授权记录的结构化键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantKey {
    pub owner: GrantOwner,
    pub object_class: String,
    pub action: String,
}

impl GrantKey {
    /// 编码为表单字段名，如 `role_<id>____Host____edit`
    pub fn wire_name(&self) -> String {
        let owner = match self.owner {
            GrantOwner::Role(id) => format!("role_{id}"),
            GrantOwner::Position(id) => format!("position_{id}"),
        };
        format!(
            "{owner}{WIRE_SEPARATOR}{}{WIRE_SEPARATOR}{}",
            self.object_class, self.action
        )
    }

    /// 从表单字段名解析。畸形的名字是客户端错误。
    pub fn parse(name: &str) -> Result<Self, AppError> {
        let parts: Vec<&str> = name.split(WIRE_SEPARATOR).collect();
        let [owner_part, object_class, action] = parts.as_slice() else {
            return Err(AppError::BadRequest(format!(
                "Malformed grant field name: {name}"
            )));
        };

        let owner = if let Some(id) = owner_part.strip_prefix("role_") {
            GrantOwner::Role(parse_uuid(id, name)?)
        } else if let Some(id) = owner_part.strip_prefix("position_") {
            GrantOwner::Position(parse_uuid(id, name)?)
        } else {
            return Err(AppError::BadRequest(format!(
                "Malformed grant field name: {name}"
            )));
        };

        Ok(Self {
            owner,
            object_class: object_class.to_string(),
            action: action.to_string(),
        })
    }
}

fn parse_uuid(raw: &str, name: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest(format!("Malformed grant field name: {name}")))
}

/// 项目自定义字段值行的表单字段名
pub fn field_wire_name(value_id: Uuid) -> String {
    format!("field_{value_id}")
}

/// 解析 `field_<id>` 形式的字段名
pub fn parse_field_name(name: &str) -> Result<Uuid, AppError> {
    name.strip_prefix("field_")
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| AppError::BadRequest(format!("Malformed field name: {name}")))
}

/// 动态表单字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Text,
    Integer,
    Select,
}

impl FieldKind {
    pub fn parse(kind: &str) -> Result<Self, AppError> {
        match kind {
            "boolean" => Ok(FieldKind::Boolean),
            "text" => Ok(FieldKind::Text),
            "integer" => Ok(FieldKind::Integer),
            "select" => Ok(FieldKind::Select),
            other => Err(AppError::Internal(format!("Unknown field kind: {other}"))),
        }
    }
}

/// 渲染给前端的一个表单字段
#[derive(Debug, Serialize)]
pub struct MatrixField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: Value,
}

/// 授权位更新请求
#[derive(Debug, serde::Deserialize)]
pub struct ApplyGrantRequest {
    pub name: String,
    pub granted: bool,
}

/// 字段值更新请求
#[derive(Debug, serde::Deserialize)]
pub struct ApplyFieldRequest {
    pub name: String,
    pub value: Value,
}

pub struct MatrixService {
    db: PgPool,
}

impl MatrixService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 角色 × 项目实体 × 动作的完整矩阵，缺失的记录现场补齐
    pub async fn role_matrix(
        &self,
        registry: &SchemaRegistry,
    ) -> Result<Vec<MatrixField>, AppError> {
        let role_repo = RoleRepository::new(self.db.clone());
        let roles = role_repo.list().await?;

        let mut fields = Vec::new();
        for role in &roles {
            for schema in registry.project_scoped() {
                for (action, label) in schema.project_actions {
                    role_repo
                        .ensure_role_grant(role.id, schema.entity, action)
                        .await?;
                    let grant = role_repo
                        .find_role_grant(role.id, schema.entity, action)
                        .await?
                        .ok_or(AppError::NotFound)?;
                    fields.push(self.grant_field(
                        GrantOwner::Role(role.id),
                        schema.entity,
                        action,
                        &role.title,
                        label,
                        grant.is_granted,
                    ));
                }
            }
        }
        Ok(fields)
    }

    /// 职位 × 目录实体 × 动作的完整矩阵
    pub async fn position_matrix(
        &self,
        registry: &SchemaRegistry,
    ) -> Result<Vec<MatrixField>, AppError> {
        let role_repo = RoleRepository::new(self.db.clone());
        let user_repo = UserRepository::new(self.db.clone());
        let positions = user_repo.list_positions().await?;

        let mut fields = Vec::new();
        for position in &positions {
            for schema in registry.global_scoped() {
                for (action, label) in schema.global_actions {
                    role_repo
                        .ensure_position_grant(position.id, schema.entity, action)
                        .await?;
                    let grant = role_repo
                        .find_position_grant(position.id, schema.entity, action)
                        .await?
                        .ok_or(AppError::NotFound)?;
                    fields.push(self.grant_field(
                        GrantOwner::Position(position.id),
                        schema.entity,
                        action,
                        &position.title,
                        label,
                        grant.is_granted,
                    ));
                }
            }
        }
        Ok(fields)
    }

    fn grant_field(
        &self,
        owner: GrantOwner,
        object_class: &str,
        action: &str,
        owner_title: &str,
        action_label: &str,
        granted: bool,
    ) -> MatrixField {
        let key = GrantKey {
            owner,
            object_class: object_class.to_string(),
            action: action.to_string(),
        };
        MatrixField {
            name: key.wire_name(),
            label: format!("{owner_title}: {action_label}"),
            kind: FieldKind::Boolean,
            value: Value::Bool(granted),
        }
    }

    /// 提交一个授权位。拥有者或记录在渲染和提交之间消失时返回 404。
    pub async fn apply_grant(&self, key: &GrantKey, granted: bool) -> Result<(), AppError> {
        let role_repo = RoleRepository::new(self.db.clone());
        let updated = match key.owner {
            GrantOwner::Role(role_id) => {
                if role_repo.find_by_id(role_id).await?.is_none() {
                    return Err(AppError::NotFound);
                }
                role_repo
                    .ensure_role_grant(role_id, &key.object_class, &key.action)
                    .await?;
                role_repo
                    .set_role_grant(role_id, &key.object_class, &key.action, granted)
                    .await?
            }
            GrantOwner::Position(position_id) => {
                let user_repo = UserRepository::new(self.db.clone());
                if user_repo.find_position_by_id(position_id).await?.is_none() {
                    return Err(AppError::NotFound);
                }
                role_repo
                    .ensure_position_grant(position_id, &key.object_class, &key.action)
                    .await?;
                role_repo
                    .set_position_grant(position_id, &key.object_class, &key.action, granted)
                    .await?
            }
        };

        if !updated {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// 项目自定义字段表单，缺失的值行现场补齐
    pub async fn project_fields_form(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<MatrixField>, AppError> {
        let project_repo = ProjectRepository::new(self.db.clone());
        project_repo.ensure_field_values(project_id).await?;

        let mut fields = Vec::new();
        for (value, def) in project_repo.list_field_values(project_id).await? {
            let kind = FieldKind::parse(&def.field_kind)?;
            fields.push(MatrixField {
                name: field_wire_name(value.id),
                label: def.title.clone(),
                kind,
                value: render_field_value(kind, &value),
            });
        }
        Ok(fields)
    }

    /// 提交一个字段值。值行在渲染和提交之间消失、或不属于该项目时返回 404。
    pub async fn apply_field(
        &self,
        project_id: Uuid,
        value_id: Uuid,
        raw: &Value,
    ) -> Result<(), AppError> {
        let project_repo = ProjectRepository::new(self.db.clone());
        let (value, def) = project_repo
            .find_field_value(value_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if value.project_id != project_id {
            return Err(AppError::NotFound);
        }

        let kind = FieldKind::parse(&def.field_kind)?;
        let normalized = normalize_field_value(kind, raw)?;

        let updated = project_repo
            .set_field_value(value_id, normalized.as_deref())
            .await?;
        if !updated {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

fn render_field_value(kind: FieldKind, value: &ProjectFieldValue) -> Value {
    let Some(stored) = &value.value else {
        return match kind {
            FieldKind::Boolean => Value::Bool(false),
            _ => Value::Null,
        };
    };
    match kind {
        FieldKind::Boolean => Value::Bool(stored == "true"),
        FieldKind::Integer => stored
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        FieldKind::Text | FieldKind::Select => Value::String(stored.clone()),
    }
}

/// 按字段类型规范化提交值为存储形式
fn normalize_field_value(kind: FieldKind, raw: &Value) -> Result<Option<String>, AppError> {
    match (kind, raw) {
        (_, Value::Null) => Ok(None),
        (FieldKind::Boolean, Value::Bool(b)) => Ok(Some(b.to_string())),
        (FieldKind::Boolean, Value::String(s)) if s == "true" || s == "false" => {
            Ok(Some(s.clone()))
        }
        (FieldKind::Integer, Value::Number(n)) if n.is_i64() => Ok(Some(n.to_string())),
        (FieldKind::Integer, Value::String(s)) => s
            .parse::<i64>()
            .map(|n| Some(n.to_string()))
            .map_err(|_| AppError::BadRequest(format!("Not an integer: {s}"))),
        (FieldKind::Text | FieldKind::Select, Value::String(s)) => Ok(Some(s.clone())),
        (kind, other) => Err(AppError::BadRequest(format!(
            "Invalid value {other} for {kind:?} field"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_key_wire_round_trip() {
        let key = GrantKey {
            owner: GrantOwner::Role(Uuid::new_v4()),
            object_class: "Host".to_string(),
            action: "edit".to_string(),
        };
        let name = key.wire_name();
        assert!(name.starts_with("role_"));
        assert!(name.contains("____Host____edit"));
        assert_eq!(GrantKey::parse(&name).unwrap(), key);

        let key = GrantKey {
            owner: GrantOwner::Position(Uuid::new_v4()),
            object_class: "IssueStatus".to_string(),
            action: "create".to_string(),
        };
        assert_eq!(GrantKey::parse(&key.wire_name()).unwrap(), key);
    }

    #[test]
    fn test_malformed_grant_names_rejected() {
        assert!(GrantKey::parse("role_abc____Host____edit").is_err());
        assert!(GrantKey::parse("Host____edit").is_err());
        assert!(GrantKey::parse(&format!("user_{}____Host____edit", Uuid::new_v4())).is_err());
        assert!(GrantKey::parse(&format!("role_{}____Host", Uuid::new_v4())).is_err());
        assert!(GrantKey::parse("").is_err());
    }

    #[test]
    fn test_field_name_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(parse_field_name(&field_wire_name(id)).unwrap(), id);
        assert!(parse_field_name("field_not-a-uuid").is_err());
        assert!(parse_field_name("grant_123").is_err());
    }

    #[test]
    fn test_field_kind_parse() {
        assert_eq!(FieldKind::parse("boolean").unwrap(), FieldKind::Boolean);
        assert_eq!(FieldKind::parse("select").unwrap(), FieldKind::Select);
        // 未知类型是数据错误，不是客户端错误
        assert!(matches!(
            FieldKind::parse("json"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_normalize_field_value() {
        assert_eq!(
            normalize_field_value(FieldKind::Boolean, &Value::Bool(true)).unwrap(),
            Some("true".to_string())
        );
        assert_eq!(
            normalize_field_value(FieldKind::Integer, &Value::String("42".into())).unwrap(),
            Some("42".to_string())
        );
        assert_eq!(normalize_field_value(FieldKind::Text, &Value::Null).unwrap(), None);
        assert!(normalize_field_value(FieldKind::Integer, &Value::String("x".into())).is_err());
        assert!(normalize_field_value(FieldKind::Boolean, &Value::String("yes".into())).is_err());
    }
}
