//! 权限服务集成测试
//!
//! 测试项目范围和全局范围的权限判定（需要数据库连接）

mod common;

use common::{assign, create_project, create_role, create_user, set_grant, setup_test_db};
use greenmine::error::AppError;
use greenmine::models::role::ANONYMOUS_ROLE_SLUG;
use greenmine::repository::role_repo::RoleRepository;
use greenmine::repository::user_repo::UserRepository;
use greenmine::schema::entities;
use greenmine::services::PermissionService;
use serial_test::serial;
use uuid::Uuid;

// ==================== 项目范围 ====================

#[tokio::test]
#[serial]
async fn test_administrator_position_always_allowed() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let admin = create_user(&pool, Some("Administrator"), "Password1").await;
    let leader = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    // 无任何角色指派、无任何授权记录
    assert!(service
        .can_on_project(admin.id, &entities::ISSUE, "delete", project_id)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_project_leader_always_allowed() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    assert!(service
        .can_on_project(leader.id, &entities::HOST, "edit", project_id)
        .await
        .unwrap());

    // 负责人身份只覆盖自己的项目
    let other_leader = create_user(&pool, None, "Password1").await;
    let other_project = create_project(&pool, other_leader.id).await;
    assert!(!service
        .can_on_project(leader.id, &entities::HOST, "edit", other_project)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_any_assigned_role_with_grant_allows() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let member = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    let denied_role = create_role(&pool).await;
    let granted_role = create_role(&pool).await;
    assign(&pool, member.id, project_id, denied_role).await;
    assign(&pool, member.id, project_id, granted_role).await;

    set_grant(&pool, denied_role, "Issue", "create", false).await;
    set_grant(&pool, granted_role, "Issue", "create", true).await;

    // 任一有效角色持有授权即通过
    assert!(service
        .can_on_project(member.id, &entities::ISSUE, "create", project_id)
        .await
        .unwrap());

    // 两个角色都没有授权时拒绝
    set_grant(&pool, granted_role, "Issue", "create", false).await;
    assert!(!service
        .can_on_project(member.id, &entities::ISSUE, "create", project_id)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_unassigned_user_falls_back_to_anonymous_role() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());
    let role_repo = RoleRepository::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let visitor = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    let anonymous = role_repo
        .find_by_slug(ANONYMOUS_ROLE_SLUG)
        .await
        .unwrap()
        .expect("seeded anonymous role");

    set_grant(&pool, anonymous.id, "Issue", "read", true).await;
    assert!(service
        .can_on_project(visitor.id, &entities::ISSUE, "read", project_id)
        .await
        .unwrap());

    set_grant(&pool, anonymous.id, "Issue", "read", false).await;
    assert!(!service
        .can_on_project(visitor.id, &entities::ISSUE, "read", project_id)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_unregistered_action_is_an_error_not_a_denial() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    // 连越权身份也不能掩盖调用方代码错误
    let result = service
        .can_on_project(leader.id, &entities::ISSUE, "fly", project_id)
        .await;
    assert!(matches!(
        result,
        Err(AppError::UnregisteredAction { .. })
    ));

    // Issue 没有全局动作
    let result = service
        .can_globally(leader.id, &entities::ISSUE, "read", None)
        .await;
    assert!(matches!(
        result,
        Err(AppError::UnregisteredAction { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_require_on_project_denial_returns_403_and_audits() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());
    let role_repo = RoleRepository::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let outsider = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    let anonymous = role_repo
        .find_by_slug(ANONYMOUS_ROLE_SLUG)
        .await
        .unwrap()
        .unwrap();
    set_grant(&pool, anonymous.id, "Host", "edit", false).await;

    let result = service
        .require_on_project(outsider.id, &entities::HOST, "edit", project_id, None)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    // 拒绝落一条审计日志
    let denied: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE user_id = $1 AND action = 'permission.denied'",
    )
    .bind(outsider.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(denied, 1);
}

// ==================== 全局范围 ====================

#[tokio::test]
#[serial]
async fn test_position_grant_controls_catalog_access() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());
    let role_repo = RoleRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool.clone());

    let pentester = create_user(&pool, Some("Pentester"), "Password1").await;
    let position_id = user_repo
        .find_position_by_title("Pentester")
        .await
        .unwrap()
        .unwrap()
        .id;

    role_repo
        .ensure_position_grant(position_id, "IssueStatus", "edit")
        .await
        .unwrap();
    role_repo
        .set_position_grant(position_id, "IssueStatus", "edit", true)
        .await
        .unwrap();
    assert!(service
        .can_globally(pentester.id, &entities::ISSUE_STATUS, "edit", None)
        .await
        .unwrap());

    role_repo
        .set_position_grant(position_id, "IssueStatus", "edit", false)
        .await
        .unwrap();
    assert!(!service
        .can_globally(pentester.id, &entities::ISSUE_STATUS, "edit", None)
        .await
        .unwrap());

    // 无职位的用户对目录对象一律拒绝
    let nobody = create_user(&pool, None, "Password1").await;
    assert!(!service
        .can_globally(nobody.id, &entities::ISSUE_STATUS, "edit", None)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_user_can_always_edit_own_account() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let user = create_user(&pool, None, "Password1").await;
    let other = create_user(&pool, None, "Password1").await;

    assert!(service
        .can_globally(user.id, &entities::USER, "edit", Some(user.id))
        .await
        .unwrap());
    assert!(!service
        .can_globally(user.id, &entities::USER, "edit", Some(other.id))
        .await
        .unwrap());
    assert!(!service
        .can_globally(user.id, &entities::USER, "edit", None)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
async fn test_require_administrator() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let admin = create_user(&pool, Some("Administrator"), "Password1").await;
    let pentester = create_user(&pool, Some("Pentester"), "Password1").await;

    service.require_administrator(admin.id).await.unwrap();

    let result = service.require_administrator(pentester.id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
#[serial]
async fn test_unknown_user_is_unauthorized() {
    let pool = setup_test_db().await;
    let service = PermissionService::new(pool.clone());

    let leader = create_user(&pool, None, "Password1").await;
    let project_id = create_project(&pool, leader.id).await;

    let result = service
        .can_on_project(Uuid::new_v4(), &entities::ISSUE, "read", project_id)
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}
