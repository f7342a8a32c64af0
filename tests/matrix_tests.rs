//! 权限矩阵与动态表单集成测试
//!
//! 测试授权记录的惰性补齐、矩阵提交以及项目自定义字段表单

mod common;

use common::{create_role, create_scratch_project, setup_test_db, unique};
use greenmine::error::AppError;
use greenmine::models::project::CreateProjectFieldRequest;
use greenmine::repository::project_repo::ProjectRepository;
use greenmine::repository::role_repo::RoleRepository;
use greenmine::repository::user_repo::UserRepository;
use greenmine::schema::SchemaRegistry;
use greenmine::services::matrix_service::{GrantKey, GrantOwner, MatrixService};
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

// ==================== 授权矩阵 ====================

#[tokio::test]
#[serial]
async fn test_role_matrix_lazily_creates_grant_rows_once() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let registry = SchemaRegistry::builtin();

    let role_id = create_role(&pool).await;

    // 新角色没有任何授权记录
    let before: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM role_object_grants WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(before, 0);

    let expected: i64 = registry
        .project_scoped()
        .map(|s| s.project_actions.len() as i64)
        .sum();

    service.role_matrix(&registry).await.unwrap();
    let after_first: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM role_object_grants WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(after_first, expected);

    // 再次渲染不重复落行
    service.role_matrix(&registry).await.unwrap();
    let after_second: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM role_object_grants WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(after_second, expected);
}

#[tokio::test]
#[serial]
async fn test_matrix_field_names_parse_back_to_keys() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let registry = SchemaRegistry::builtin();

    let role_id = create_role(&pool).await;
    let fields = service.role_matrix(&registry).await.unwrap();

    // 每个字段名都能无损解析回结构化键
    let mut seen_own_role = false;
    for field in &fields {
        let key = GrantKey::parse(&field.name).unwrap();
        assert_eq!(key.wire_name(), field.name);
        if key.owner == GrantOwner::Role(role_id) {
            seen_own_role = true;
            // 新角色的格子默认未授权
            assert_eq!(field.value, Value::Bool(false));
        }
    }
    assert!(seen_own_role);
}

#[tokio::test]
#[serial]
async fn test_apply_grant_round_trip() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let role_repo = RoleRepository::new(pool.clone());

    let role_id = create_role(&pool).await;
    let key = GrantKey {
        owner: GrantOwner::Role(role_id),
        object_class: "Host".to_string(),
        action: "edit".to_string(),
    };

    // 记录尚不存在，提交时现场补齐再更新
    service.apply_grant(&key, true).await.unwrap();
    let grant = role_repo
        .find_role_grant(role_id, "Host", "edit")
        .await
        .unwrap()
        .unwrap();
    assert!(grant.is_granted);

    service.apply_grant(&key, false).await.unwrap();
    let grant = role_repo
        .find_role_grant(role_id, "Host", "edit")
        .await
        .unwrap()
        .unwrap();
    assert!(!grant.is_granted);
}

#[tokio::test]
#[serial]
async fn test_apply_grant_for_vanished_role_is_not_found() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());

    let key = GrantKey {
        owner: GrantOwner::Role(Uuid::new_v4()),
        object_class: "Host".to_string(),
        action: "edit".to_string(),
    };
    let result = service.apply_grant(&key, true).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
#[serial]
async fn test_apply_grant_for_vanished_position_is_not_found() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());

    // 职位和角色一样: 消失的拥有者是 404，不是外键冲突
    let key = GrantKey {
        owner: GrantOwner::Position(Uuid::new_v4()),
        object_class: "IssueStatus".to_string(),
        action: "edit".to_string(),
    };
    let result = service.apply_grant(&key, true).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
#[serial]
async fn test_position_matrix_covers_catalog_entities() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let registry = SchemaRegistry::builtin();
    let user_repo = UserRepository::new(pool.clone());

    let fields = service.position_matrix(&registry).await.unwrap();

    let positions = user_repo.list_positions().await.unwrap();
    let per_position: i64 = registry
        .global_scoped()
        .map(|s| s.global_actions.len() as i64)
        .sum();
    assert_eq!(fields.len() as i64, positions.len() as i64 * per_position);

    for field in &fields {
        let key = GrantKey::parse(&field.name).unwrap();
        assert!(matches!(key.owner, GrantOwner::Position(_)));
    }
}

// ==================== 项目自定义字段 ====================

#[tokio::test]
#[serial]
async fn test_project_fields_form_lazily_creates_value_rows() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let project_repo = ProjectRepository::new(pool.clone());

    project_repo
        .create_field_def(&CreateProjectFieldRequest {
            title: unique("Reviewed"),
            field_kind: "boolean".to_string(),
        })
        .await
        .unwrap();
    project_repo
        .create_field_def(&CreateProjectFieldRequest {
            title: unique("Notes"),
            field_kind: "text".to_string(),
        })
        .await
        .unwrap();

    let project_id = create_scratch_project(&pool).await;
    let defs = project_repo.list_field_defs().await.unwrap();

    let fields = service.project_fields_form(project_id).await.unwrap();
    assert_eq!(fields.len(), defs.len());

    // 再次渲染不重复落行
    let fields_again = service.project_fields_form(project_id).await.unwrap();
    assert_eq!(fields_again.len(), defs.len());

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM project_field_values WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows as usize, defs.len());
}

#[tokio::test]
#[serial]
async fn test_apply_field_round_trip() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let project_repo = ProjectRepository::new(pool.clone());

    let def_title = unique("Severity cap");
    project_repo
        .create_field_def(&CreateProjectFieldRequest {
            title: def_title.clone(),
            field_kind: "integer".to_string(),
        })
        .await
        .unwrap();

    let project_id = create_scratch_project(&pool).await;
    let fields = service.project_fields_form(project_id).await.unwrap();
    let field = fields.iter().find(|f| f.label == def_title).unwrap();
    assert_eq!(field.value, Value::Null);

    let value_id = greenmine::services::matrix_service::parse_field_name(&field.name).unwrap();
    service
        .apply_field(project_id, value_id, &json!(7))
        .await
        .unwrap();

    let fields = service.project_fields_form(project_id).await.unwrap();
    let field = fields.iter().find(|f| f.label == def_title).unwrap();
    assert_eq!(field.value, json!(7));

    // 类型不符的提交是客户端错误
    let result = service
        .apply_field(project_id, value_id, &json!("not a number"))
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
#[serial]
async fn test_apply_field_rejects_vanished_and_foreign_rows() {
    let pool = setup_test_db().await;
    let service = MatrixService::new(pool.clone());
    let project_repo = ProjectRepository::new(pool.clone());

    project_repo
        .create_field_def(&CreateProjectFieldRequest {
            title: unique("Scope"),
            field_kind: "text".to_string(),
        })
        .await
        .unwrap();

    let project_a = create_scratch_project(&pool).await;
    let project_b = create_scratch_project(&pool).await;

    // 表单渲染和提交之间行已消失
    let result = service
        .apply_field(project_a, Uuid::new_v4(), &json!("x"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));

    // 值行属于另一个项目
    let fields = service.project_fields_form(project_b).await.unwrap();
    let foreign = greenmine::services::matrix_service::parse_field_name(&fields[0].name).unwrap();
    let result = service.apply_field(project_a, foreign, &json!("x")).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}
