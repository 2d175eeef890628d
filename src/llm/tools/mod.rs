//! 研究工具集 - 显式工具定义与按角色解析
//!
//! 工具在注册表构造时一次性解析为显式的描述+执行器组合，
//! 不依赖运行期反射。监督者是纯决策节点，不持有任何副作用工具。

pub mod mcp;
pub mod search;
pub mod think;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, SearchProvider};

/// 工具描述 - 名称、说明与JSON Schema参数定义
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDescriptor {
    /// 转换为rig的工具定义，用于绑定到模型请求
    pub(crate) fn to_rig_definition(&self) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// 工具执行错误
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("工具参数无效: {0}")]
    InvalidArgs(String),
    #[error("工具执行失败: {0}")]
    Execution(String),
}

/// 可执行研究工具
#[async_trait]
pub trait ResearchTool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

/// 工具角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRole {
    /// 监督者 - 纯决策节点，不绑定副作用工具
    Supervisor,
    /// 研究单元 - 搜索、反思与已启用的MCP工具
    Researcher,
}

/// 按角色解析可用工具集合。
/// MCP发现失败时降级为内置工具集，系统以缩减后的工具面继续运行。
pub async fn tools_for_role(role: ToolRole, config: &Config) -> Vec<Arc<dyn ResearchTool>> {
    match role {
        ToolRole::Supervisor => Vec::new(),
        ToolRole::Researcher => {
            let mut tools: Vec<Arc<dyn ResearchTool>> = Vec::new();

            match config.research.search_provider {
                SearchProvider::Serper => {
                    tools.push(Arc::new(search::SerperSearch::new(config.search.clone())));
                }
                SearchProvider::Tavily => {
                    tools.push(Arc::new(search::TavilySearch::new(config.search.clone())));
                }
                SearchProvider::None => {}
            }

            tools.push(Arc::new(think::ThinkTool));

            match mcp::discover_tools(config).await {
                Ok(mcp_tools) => {
                    if !mcp_tools.is_empty() {
                        println!("   🔧 已加载 {} 个MCP工具", mcp_tools.len());
                    }
                    tools.extend(mcp_tools);
                }
                Err(e) => {
                    eprintln!("   ⚠️ MCP工具发现失败，降级为内置工具: {}", e);
                }
            }

            tools
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_supervisor_gets_no_tools() {
        let config = Config::default();
        let tools = tools_for_role(ToolRole::Supervisor, &config).await;
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn test_researcher_tools_without_search_provider() {
        let mut config = Config::default();
        config.research.search_provider = SearchProvider::None;
        config.mcp.enabled = false;

        let tools = tools_for_role(ToolRole::Researcher, &config).await;
        let names: Vec<String> = tools.iter().map(|t| t.descriptor().name).collect();

        assert_eq!(names, vec!["think".to_string()]);
    }

    #[tokio::test]
    async fn test_researcher_tools_with_serper() {
        let mut config = Config::default();
        config.research.search_provider = SearchProvider::Serper;
        config.mcp.enabled = false;

        let tools = tools_for_role(ToolRole::Researcher, &config).await;
        let names: Vec<String> = tools.iter().map(|t| t.descriptor().name).collect();

        assert!(names.contains(&"serper_search".to_string()));
        assert!(names.contains(&"think".to_string()));
    }
}
