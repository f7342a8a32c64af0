//! 内置功能区的环境描述符
//!
//! 注册顺序是故意打乱的，最终顺序完全由 after 链决定:
//! overview -> networks -> hosts -> services -> issues。

use super::{
    EnvironmentDescriptor, PageNode, PageObject, RegistryBuilder, SidebarItem,
};
use serde_json::Value;

fn item(title: &str, link: String, icon: &str, current: bool) -> SidebarItem {
    SidebarItem { title: title.to_string(), link, icon: icon.to_string(), is_current_page: current }
}

fn overview_sidebar(page: &PageObject, active: &str) -> Vec<SidebarItem> {
    vec![item(
        "Overview",
        format!("/projects/{}", page.project.id),
        "home",
        active == "overview",
    )]
}

fn overview_context(page: &PageObject) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert(
        "project".to_string(),
        serde_json::to_value(&page.project).unwrap_or(Value::Null),
    );
    map
}

fn networks_sidebar(page: &PageObject, active: &str) -> Vec<SidebarItem> {
    vec![item(
        "Networks",
        format!("/projects/{}/networks", page.project.id),
        "sitemap",
        active == "networks",
    )]
}

fn networks_context(page: &PageObject) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    if let PageNode::Network(network) = &page.node {
        map.insert(
            "network".to_string(),
            serde_json::to_value(network).unwrap_or(Value::Null),
        );
    }
    map
}

fn hosts_sidebar(page: &PageObject, active: &str) -> Vec<SidebarItem> {
    vec![item(
        "Hosts",
        format!("/projects/{}/hosts", page.project.id),
        "server",
        active == "hosts",
    )]
}

fn hosts_context(page: &PageObject) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    if let PageNode::Host(host) = &page.node {
        map.insert("host".to_string(), serde_json::to_value(host).unwrap_or(Value::Null));
    }
    map
}

fn services_sidebar(page: &PageObject, active: &str) -> Vec<SidebarItem> {
    vec![item(
        "Services",
        format!("/projects/{}/services", page.project.id),
        "plug",
        active == "services",
    )]
}

fn services_context(page: &PageObject) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    if let PageNode::Service(service) = &page.node {
        map.insert(
            "service".to_string(),
            serde_json::to_value(service).unwrap_or(Value::Null),
        );
    }
    map
}

fn issues_sidebar(page: &PageObject, active: &str) -> Vec<SidebarItem> {
    vec![item(
        "Issues",
        format!("/projects/{}/issues", page.project.id),
        "bug",
        active == "issues",
    )]
}

fn issues_context(page: &PageObject) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    if let PageNode::Issue(issue) = &page.node {
        map.insert("issue".to_string(), serde_json::to_value(issue).unwrap_or(Value::Null));
    }
    map
}

/// 注册全部内置功能区
pub fn builtin() -> RegistryBuilder {
    RegistryBuilder::new()
        .register(
            EnvironmentDescriptor { name: "hosts", sidebar: hosts_sidebar, context: hosts_context },
            Some("networks"),
        )
        .register(
            EnvironmentDescriptor {
                name: "overview",
                sidebar: overview_sidebar,
                context: overview_context,
            },
            None,
        )
        .register(
            EnvironmentDescriptor {
                name: "issues",
                sidebar: issues_sidebar,
                context: issues_context,
            },
            Some("services"),
        )
        .register(
            EnvironmentDescriptor {
                name: "networks",
                sidebar: networks_sidebar,
                context: networks_context,
            },
            Some("overview"),
        )
        .register(
            EnvironmentDescriptor {
                name: "services",
                sidebar: services_sidebar,
                context: services_context,
            },
            Some("hosts"),
        )
}
