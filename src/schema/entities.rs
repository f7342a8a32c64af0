//! 内置实体的静态结构声明

use super::{ColumnDef, ColumnKind, EntitySchema, RelationDef};

pub static PROJECT: EntitySchema = EntitySchema {
    entity: "Project",
    table: "projects",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "description", kind: ColumnKind::Text },
        ColumnDef { name: "is_archived", kind: ColumnKind::Boolean },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
        ColumnDef { name: "updated_at", kind: ColumnKind::DateTime },
    ],
    relations: &[
        RelationDef { name: "leader", target: "User", fk_column: "leader_id", to_many: false },
    ],
    default_columns: &["title", "description", "leader", "is_archived", "created_at"],
    project_actions: &[
        ("read", "Read project"),
        ("edit", "Edit project"),
        ("archive", "Archive project"),
        ("manage_permissions", "Manage project permissions"),
    ],
    global_actions: &[("create", "Create projects")],
};

pub static NETWORK: EntitySchema = EntitySchema {
    entity: "Network",
    table: "networks",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "address", kind: ColumnKind::Text },
        ColumnDef { name: "description", kind: ColumnKind::Text },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
    ],
    relations: &[
        RelationDef { name: "project", target: "Project", fk_column: "project_id", to_many: false },
        RelationDef { name: "hosts", target: "Host", fk_column: "network_id", to_many: true },
    ],
    default_columns: &["title", "address", "description", "created_at"],
    project_actions: &[
        ("read", "Read networks"),
        ("create", "Create networks"),
        ("edit", "Edit networks"),
        ("delete", "Delete networks"),
    ],
    global_actions: &[],
};

pub static HOST: EntitySchema = EntitySchema {
    entity: "Host",
    table: "hosts",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "ip_address", kind: ColumnKind::Text },
        ColumnDef { name: "os", kind: ColumnKind::Text },
        ColumnDef { name: "is_online", kind: ColumnKind::Boolean },
        ColumnDef { name: "description", kind: ColumnKind::Text },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
    ],
    relations: &[
        RelationDef { name: "project", target: "Project", fk_column: "project_id", to_many: false },
        RelationDef { name: "network", target: "Network", fk_column: "network_id", to_many: false },
        RelationDef { name: "services", target: "Service", fk_column: "host_id", to_many: true },
    ],
    default_columns: &[
        "title",
        "ip_address",
        "os",
        "is_online",
        "network",
        "services",
        "description",
        "created_at",
    ],
    project_actions: &[
        ("read", "Read hosts"),
        ("create", "Create hosts"),
        ("edit", "Edit hosts"),
        ("delete", "Delete hosts"),
    ],
    global_actions: &[],
};

pub static SERVICE: EntitySchema = EntitySchema {
    entity: "Service",
    table: "services",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "port", kind: ColumnKind::Integer },
        ColumnDef { name: "protocol", kind: ColumnKind::Text },
        ColumnDef { name: "state", kind: ColumnKind::Text },
        ColumnDef { name: "description", kind: ColumnKind::Text },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
    ],
    relations: &[
        RelationDef { name: "project", target: "Project", fk_column: "project_id", to_many: false },
        RelationDef { name: "host", target: "Host", fk_column: "host_id", to_many: false },
    ],
    default_columns: &[
        "title",
        "port",
        "protocol",
        "state",
        "host",
        "host.network.title-input",
        "created_at",
    ],
    project_actions: &[
        ("read", "Read services"),
        ("create", "Create services"),
        ("edit", "Edit services"),
        ("delete", "Delete services"),
    ],
    global_actions: &[],
};

pub static ISSUE: EntitySchema = EntitySchema {
    entity: "Issue",
    table: "issues",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "description", kind: ColumnKind::Text },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
        ColumnDef { name: "updated_at", kind: ColumnKind::DateTime },
    ],
    relations: &[
        RelationDef { name: "project", target: "Project", fk_column: "project_id", to_many: false },
        RelationDef { name: "status", target: "IssueStatus", fk_column: "status_id", to_many: false },
        RelationDef {
            name: "priority",
            target: "IssuePriority",
            fk_column: "priority_id",
            to_many: false,
        },
    ],
    default_columns: &[
        "title",
        "description",
        "status",
        "priority",
        "priority.color-input",
        "created_at",
    ],
    project_actions: &[
        ("read", "Read issues"),
        ("create", "Create issues"),
        ("edit", "Edit issues"),
        ("delete", "Delete issues"),
    ],
    global_actions: &[],
};

pub static ISSUE_STATUS: EntitySchema = EntitySchema {
    entity: "IssueStatus",
    table: "issue_statuses",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
    ],
    relations: &[],
    default_columns: &["title"],
    project_actions: &[],
    global_actions: &[
        ("read", "Read issue statuses"),
        ("create", "Create issue statuses"),
        ("edit", "Edit issue statuses"),
        ("delete", "Delete issue statuses"),
    ],
};

pub static ISSUE_PRIORITY: EntitySchema = EntitySchema {
    entity: "IssuePriority",
    table: "issue_priorities",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "color", kind: ColumnKind::Text },
    ],
    relations: &[],
    default_columns: &["title", "color"],
    project_actions: &[],
    global_actions: &[
        ("read", "Read issue priorities"),
        ("create", "Create issue priorities"),
        ("edit", "Edit issue priorities"),
        ("delete", "Delete issue priorities"),
    ],
};

pub static USER: EntitySchema = EntitySchema {
    entity: "User",
    table: "users",
    columns: &[
        ColumnDef { name: "id", kind: ColumnKind::Uuid },
        ColumnDef { name: "username", kind: ColumnKind::Text },
        ColumnDef { name: "title", kind: ColumnKind::Text },
        ColumnDef { name: "email", kind: ColumnKind::Text },
        ColumnDef { name: "created_at", kind: ColumnKind::DateTime },
    ],
    relations: &[],
    default_columns: &["username", "title", "email", "created_at"],
    project_actions: &[],
    global_actions: &[
        ("read", "Read users"),
        ("create", "Create users"),
        ("edit", "Edit users"),
        ("delete", "Delete users"),
    ],
};
