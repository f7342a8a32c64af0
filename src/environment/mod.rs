//! 页面环境注册表
//!
//! 每个功能区以一份描述符声明自己贡献的侧边栏条目和模板上下文。
//! 描述符注册时可以声明排在哪个前驱之后; 注册顺序本身不决定最终
//! 顺序。构建阶段做不动点拼接，未能落位的描述符（前驱不存在或成环）
//! 直接报错，不静默丢弃。构建后的注册表不可变。

pub mod descriptors;

use crate::error::AppError;
use crate::models::inventory::{Host, Network, Service};
use crate::models::issue::Issue;
use crate::models::project::Project;
use serde::Serialize;
use serde_json::Value;

/// 侧边栏条目
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SidebarItem {
    pub title: String,
    pub link: String,
    pub icon: String,
    pub is_current_page: bool,
}

/// 当前页面聚焦的对象
#[derive(Debug, Clone)]
pub enum PageNode {
    Project,
    Network(Network),
    Host(Host),
    Service(Service),
    Issue(Issue),
}

/// 构建环境的输入: 所在项目和聚焦对象
#[derive(Debug, Clone)]
pub struct PageObject {
    pub project: Project,
    pub node: PageNode,
}

/// 生成一个功能区的侧边栏条目；active 是当前功能区名
pub type SidebarBuilder = fn(&PageObject, &str) -> Vec<SidebarItem>;

/// 生成一个功能区贡献的模板上下文键值
pub type ContextBuilder = fn(&PageObject) -> serde_json::Map<String, Value>;

/// 一个功能区的环境描述符
#[derive(Clone)]
pub struct EnvironmentDescriptor {
    pub name: &'static str,
    pub sidebar: SidebarBuilder,
    pub context: ContextBuilder,
}

/// 聚合后的页面环境
#[derive(Debug, Serialize)]
pub struct Environment {
    pub sidebar: Vec<SidebarItem>,
    pub context: serde_json::Map<String, Value>,
}

/// 注册期的可变构建器
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<(EnvironmentDescriptor, Option<&'static str>)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册描述符。`after` 指定前驱功能区名，None 表示排在最前。
    pub fn register(mut self, descriptor: EnvironmentDescriptor, after: Option<&'static str>) -> Self {
        self.pending.push((descriptor, after));
        self
    }

    /// 不动点拼接出最终顺序并冻结。
    ///
    /// 每一轮把前驱已落位的描述符插到前驱之后，直到一轮无进展为止；
    /// 仍未落位的说明前驱不存在或互相成环，这是启动期配置错误。
    pub fn build(self) -> Result<EnvironmentRegistry, AppError> {
        let mut ordered: Vec<EnvironmentDescriptor> = Vec::with_capacity(self.pending.len());
        let mut pending = self.pending;

        loop {
            let mut unplaced = Vec::new();
            let before = pending.len();

            for (descriptor, after) in pending {
                match after {
                    None => ordered.insert(0, descriptor),
                    Some(name) => {
                        match ordered.iter().position(|d| d.name == name) {
                            Some(pos) => ordered.insert(pos + 1, descriptor),
                            None => unplaced.push((descriptor, Some(name))),
                        }
                    }
                }
            }

            if unplaced.is_empty() {
                break;
            }
            if unplaced.len() == before {
                let names: Vec<String> = unplaced
                    .iter()
                    .map(|(d, after)| format!("{} (after {})", d.name, after.unwrap_or("-")))
                    .collect();
                return Err(AppError::Config(format!(
                    "Environment descriptors could not be ordered: {}",
                    names.join(", ")
                )));
            }
            pending = unplaced;
        }

        Ok(EnvironmentRegistry { ordered })
    }
}

/// 冻结后的注册表，启动后只读
pub struct EnvironmentRegistry {
    ordered: Vec<EnvironmentDescriptor>,
}

impl EnvironmentRegistry {
    /// 最终顺序下的功能区名
    pub fn names(&self) -> Vec<&'static str> {
        self.ordered.iter().map(|d| d.name).collect()
    }

    /// 聚合整页环境: 按序拼接侧边栏，合并上下文（后注册者覆盖先注册者）
    pub fn build_environment(&self, page: &PageObject, active: &str) -> Environment {
        let mut sidebar = Vec::new();
        let mut context = serde_json::Map::new();
        for descriptor in &self.ordered {
            sidebar.extend((descriptor.sidebar)(page, active));
            for (key, value) in (descriptor.context)(page) {
                context.insert(key, value);
            }
        }
        Environment { sidebar, context }
    }
}
