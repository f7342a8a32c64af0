//! 通用表格管线集成测试
//!
//! 对真实数据库执行完整的 解析 -> 构建 -> 执行 -> 渲染 流程

mod common;

use common::{create_scratch_project, create_test_config, setup_test_db, unique};
use greenmine::models::inventory::{CreateHostRequest, CreateServiceRequest};
use greenmine::models::issue::CreateIssueRequest;
use greenmine::repository::inventory_repo::InventoryRepository;
use greenmine::repository::issue_repo::IssueRepository;
use greenmine::schema::{entities, SchemaRegistry};
use greenmine::table::{self, BindValue, ScopeFilter, Synthesizer, TableParams};
use serde_json::Value;
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

fn params(items: &[(&str, &str)]) -> TableParams {
    let pairs: Vec<(String, String)> = items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    TableParams::from_pairs(&pairs).unwrap()
}

fn columns(schema: &greenmine::schema::EntitySchema) -> Vec<String> {
    schema.default_columns.iter().map(|s| s.to_string()).collect()
}

/// 按标题查目录对象 ID
async fn status_id(pool: &PgPool, title: &str) -> Uuid {
    let repo = IssueRepository::new(pool.clone());
    repo.list_statuses()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.title == title)
        .expect("seeded status")
        .id
}

async fn priority_id(pool: &PgPool, title: &str) -> Uuid {
    let repo = IssueRepository::new(pool.clone());
    repo.list_priorities()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.title == title)
        .expect("seeded priority")
        .id
}

async fn create_issue(
    pool: &PgPool,
    project_id: Uuid,
    title: &str,
    status_id: Option<Uuid>,
    priority_id: Option<Uuid>,
) -> Uuid {
    let repo = IssueRepository::new(pool.clone());
    repo.create(
        project_id,
        &CreateIssueRequest {
            title: title.to_string(),
            description: None,
            status_id,
            priority_id,
        },
    )
    .await
    .unwrap()
    .id
}

async fn fetch_issues(
    pool: &PgPool,
    project_id: Uuid,
    params: &TableParams,
) -> table::TableData {
    let registry = SchemaRegistry::builtin();
    let cfg = create_test_config().table;
    table::fetch_table_data(
        pool,
        &registry,
        &cfg,
        &entities::ISSUE,
        &columns(&entities::ISSUE),
        params,
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &[],
    )
    .await
    .unwrap()
}

// ==================== 计数与分页 ====================

#[tokio::test]
#[serial]
async fn test_total_counts_all_filtered_rows_across_pages() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    for i in 0..3 {
        create_issue(&pool, project_id, &format!("issue {i}"), None, None).await;
    }

    let data = fetch_issues(&pool, project_id, &TableParams::default()).await;
    assert_eq!(data.total, 3);
    assert_eq!(data.rows.len(), 3);

    // 分页缩小行集但不影响 total
    let data = fetch_issues(&pool, project_id, &params(&[("limit", "2")])).await;
    assert_eq!(data.total, 3);
    assert_eq!(data.rows.len(), 2);

    let data = fetch_issues(&pool, project_id, &params(&[("limit", "2"), ("offset", "2")])).await;
    assert_eq!(data.total, 3);
    assert_eq!(data.rows.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_empty_search_excludes_nothing() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    // 状态、优先级、描述全空的行也必须出现
    create_issue(&pool, project_id, "bare issue", None, None).await;
    let open = status_id(&pool, "Open").await;
    create_issue(&pool, project_id, "full issue", Some(open), None).await;

    let data = fetch_issues(&pool, project_id, &params(&[("search", "")])).await;
    assert_eq!(data.total, 2);
    assert_eq!(data.rows.len(), 2);

    // 未关联的状态渲染为 "-"
    let bare = data
        .rows
        .iter()
        .find(|r| r.get("title").unwrap() == "bare issue")
        .unwrap();
    assert_eq!(bare.get("status").unwrap(), "-");
    assert_eq!(bare.get("description").unwrap(), "");
}

#[tokio::test]
#[serial]
async fn test_search_narrows_rows_and_count_together() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    let marker = unique("needle");
    create_issue(&pool, project_id, &marker, None, None).await;
    create_issue(&pool, project_id, "unrelated", None, None).await;

    let data = fetch_issues(&pool, project_id, &params(&[("search", &marker)])).await;
    assert_eq!(data.total, 1);
    assert_eq!(data.rows.len(), 1);
    assert_eq!(data.rows[0].get("title").unwrap().as_str().unwrap(), marker);
}

// ==================== 排序 ====================

#[tokio::test]
#[serial]
async fn test_sort_by_relation_orders_by_related_title() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    let open = status_id(&pool, "Open").await;
    let closed = status_id(&pool, "Closed").await;

    create_issue(&pool, project_id, "second", Some(open), None).await;
    create_issue(&pool, project_id, "first", Some(closed), None).await;
    create_issue(&pool, project_id, "third", Some(open), None).await;

    let data = fetch_issues(
        &pool,
        project_id,
        &params(&[("sort", "status"), ("order", "asc")]),
    )
    .await;

    let statuses: Vec<&str> = data
        .rows
        .iter()
        .map(|r| r.get("status").unwrap().as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["Closed", "Open", "Open"]);

    // 同值行由恒定的末位排序键决定顺序，重复执行结果一致
    let again = fetch_issues(
        &pool,
        project_id,
        &params(&[("sort", "status"), ("order", "asc")]),
    )
    .await;
    let ids: Vec<&Value> = data.rows.iter().map(|r| r.get("_id").unwrap()).collect();
    let ids_again: Vec<&Value> = again.rows.iter().map(|r| r.get("_id").unwrap()).collect();
    assert_eq!(ids, ids_again);
}

// ==================== 过滤 ====================

#[tokio::test]
#[serial]
async fn test_filter_by_relation_foreign_key() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    let open = status_id(&pool, "Open").await;
    let closed = status_id(&pool, "Closed").await;
    create_issue(&pool, project_id, "open one", Some(open), None).await;
    create_issue(&pool, project_id, "closed one", Some(closed), None).await;

    let filter = format!(r#"{{"status":"{closed}"}}"#);
    let data = fetch_issues(&pool, project_id, &params(&[("filter", &filter)])).await;
    assert_eq!(data.total, 1);
    assert_eq!(
        data.rows[0].get("title").unwrap().as_str().unwrap(),
        "closed one"
    );
}

#[tokio::test]
#[serial]
async fn test_select_suffix_filter_matches_whole_value() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    let critical = priority_id(&pool, "Critical").await;
    let high = priority_id(&pool, "High").await;
    create_issue(&pool, project_id, "red", None, Some(critical)).await;
    create_issue(&pool, project_id, "orange", None, Some(high)).await;

    let registry = SchemaRegistry::builtin();
    let cfg = create_test_config().table;
    let cols = vec!["title".to_string(), "priority.color-select".to_string()];
    let scope = [ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }];

    let filtered = params(&[("filter", r##"{"priority.color-select":"#f44336"}"##)]);
    let data = table::fetch_table_data(
        &pool,
        &registry,
        &cfg,
        &entities::ISSUE,
        &cols,
        &filtered,
        &scope,
        &[],
    )
    .await
    .unwrap();
    assert_eq!(data.total, 1);
    assert_eq!(data.rows[0].get("title").unwrap(), "red");

    // 等值匹配，前缀不命中
    let prefix = params(&[("filter", r##"{"priority.color-select":"#f44"}"##)]);
    let data = table::fetch_table_data(
        &pool,
        &registry,
        &cfg,
        &entities::ISSUE,
        &cols,
        &prefix,
        &scope,
        &[],
    )
    .await
    .unwrap();
    assert_eq!(data.total, 0);
}

#[tokio::test]
#[serial]
async fn test_scope_confines_rows_to_the_project() {
    let pool = setup_test_db().await;
    let project_a = create_scratch_project(&pool).await;
    let project_b = create_scratch_project(&pool).await;

    create_issue(&pool, project_a, "in a", None, None).await;
    create_issue(&pool, project_b, "in b", None, None).await;

    let data = fetch_issues(&pool, project_a, &TableParams::default()).await;
    assert_eq!(data.total, 1);
    assert_eq!(data.rows[0].get("title").unwrap(), "in a");
}

// ==================== 合成列与渲染 ====================

#[tokio::test]
#[serial]
async fn test_synthesized_background_color_from_priority() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;

    let critical = priority_id(&pool, "Critical").await;
    create_issue(&pool, project_id, "boom", None, Some(critical)).await;
    create_issue(&pool, project_id, "calm", None, None).await;

    let synthesizers: Vec<(String, Synthesizer)> = vec![(
        "_bg_color".to_string(),
        Box::new(|row| {
            row.get("priority.color-input")
                .cloned()
                .unwrap_or(Value::String(String::new()))
        }),
    )];

    let registry = SchemaRegistry::builtin();
    let cfg = create_test_config().table;
    let data = table::fetch_table_data(
        &pool,
        &registry,
        &cfg,
        &entities::ISSUE,
        &columns(&entities::ISSUE),
        &TableParams::default(),
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &synthesizers,
    )
    .await
    .unwrap();

    let boom = data
        .rows
        .iter()
        .find(|r| r.get("title").unwrap() == "boom")
        .unwrap();
    assert_eq!(boom.get("_bg_color").unwrap(), "#f44336");

    // 无优先级的行合成空串
    let calm = data
        .rows
        .iter()
        .find(|r| r.get("title").unwrap() == "calm")
        .unwrap();
    assert_eq!(calm.get("_bg_color").unwrap(), "");
}

#[tokio::test]
#[serial]
async fn test_host_row_rendering_boolean_and_to_many_preview() {
    let pool = setup_test_db().await;
    let project_id = create_scratch_project(&pool).await;
    let repo = InventoryRepository::new(pool.clone());

    let host = repo
        .create_host(
            project_id,
            &CreateHostRequest {
                title: unique("host"),
                ip_address: "10.0.0.5".to_string(),
                network_id: None,
                os: None,
                description: None,
            },
        )
        .await
        .unwrap();

    for (title, port) in [("ssh", 22), ("http", 80)] {
        repo.create_service(
            project_id,
            &CreateServiceRequest {
                host_id: host.id,
                title: title.to_string(),
                port,
                protocol: None,
                description: None,
            },
        )
        .await
        .unwrap();
    }

    let registry = SchemaRegistry::builtin();
    let cfg = create_test_config().table;
    let data = table::fetch_table_data(
        &pool,
        &registry,
        &cfg,
        &entities::HOST,
        &columns(&entities::HOST),
        &TableParams::default(),
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &[],
    )
    .await
    .unwrap();

    assert_eq!(data.total, 1);
    let row = &data.rows[0];
    assert_eq!(row.get("is_online").unwrap(), "Yes");
    // 未归属网络显示 "-"
    assert_eq!(row.get("network").unwrap(), "-");
    // 一对多预览按标题排序拼接
    assert_eq!(row.get("services").unwrap(), "http, ssh");
    assert_eq!(row.get("os").unwrap(), "-");
}
