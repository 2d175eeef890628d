//! MCP工具源 - 从已配置的MCP服务器发现并封装外部工具
//!
//! 发现阶段逐服务器容错：单个服务器不可达只会丢失该服务器的工具，
//! 不会阻塞其余系统运行。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ResearchTool, ToolDescriptor, ToolError};
use crate::config::{Config, McpServerConfig};

/// MCP服务器返回的工具描述
#[derive(Debug, Clone, Deserialize)]
struct McpToolInfo {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "inputSchema", default)]
    input_schema: Option<serde_json::Value>,
}

/// 封装单个远端MCP工具
pub struct McpRemoteTool {
    server: McpServerConfig,
    info: McpToolInfo,
    client: reqwest::Client,
}

impl McpRemoteTool {
    /// 带服务器前缀的工具名，避免不同服务器的同名工具冲突
    fn qualified_name(&self) -> String {
        format!("{}__{}", self.server.id, self.info.name)
    }
}

#[async_trait]
impl ResearchTool for McpRemoteTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.qualified_name(),
            description: self.info.description.clone(),
            parameters: self
                .info
                .input_schema
                .clone()
                .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": self.info.name,
                "arguments": args,
            }
        });

        let response = self
            .client
            .post(&self.server.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("MCP调用失败: {}", e)))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("解析MCP响应失败: {}", e)))?;

        if let Some(error) = body.get("error") {
            return Err(ToolError::Execution(format!("MCP服务器错误: {}", error)));
        }

        Ok(render_call_result(body.get("result")))
    }
}

/// 将MCP调用结果展开为文本
fn render_call_result(result: Option<&serde_json::Value>) -> String {
    let Some(result) = result else {
        return String::new();
    };

    // 标准MCP响应的content是一组分块，取出其中的文本分块拼接
    if let Some(content) = result.get("content").and_then(|v| v.as_array()) {
        let texts: Vec<String> = content
            .iter()
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .map(|t| t.to_string())
            .collect();
        if !texts.is_empty() {
            return texts.join("\n");
        }
    }

    result.to_string()
}

/// 从所有已启用的MCP服务器发现工具。
/// 单个服务器发现失败记录告警并跳过，整体调用不因此失败。
pub async fn discover_tools(config: &Config) -> anyhow::Result<Vec<Arc<dyn ResearchTool>>> {
    let servers = config.enabled_mcp_servers();
    if servers.is_empty() {
        return Ok(Vec::new());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.mcp.timeout_seconds))
        .build()?;

    let mut tools: Vec<Arc<dyn ResearchTool>> = Vec::new();

    for server in servers {
        match list_server_tools(&client, &server).await {
            Ok(infos) => {
                for info in infos {
                    tools.push(Arc::new(McpRemoteTool {
                        server: server.clone(),
                        info,
                        client: client.clone(),
                    }));
                }
            }
            Err(e) => {
                eprintln!("   ⚠️ MCP服务器 {} 不可用: {}", server.id, e);
            }
        }
    }

    Ok(tools)
}

async fn list_server_tools(
    client: &reqwest::Client,
    server: &McpServerConfig,
) -> anyhow::Result<Vec<McpToolInfo>> {
    let payload = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/list",
    });

    let response = client.post(&server.url).json(&payload).send().await?;
    let body: serde_json::Value = response.json().await?;

    if let Some(error) = body.get("error") {
        anyhow::bail!("MCP服务器错误: {}", error);
    }

    let tools = body
        .get("result")
        .and_then(|r| r.get("tools"))
        .cloned()
        .unwrap_or_else(|| serde_json::json!([]));

    Ok(serde_json::from_value(tools)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_call_result_text_blocks() {
        let result = serde_json::json!({
            "content": [
                {"type": "text", "text": "第一行"},
                {"type": "text", "text": "第二行"}
            ]
        });
        assert_eq!(render_call_result(Some(&result)), "第一行\n第二行");
    }

    #[test]
    fn test_render_call_result_fallback() {
        let result = serde_json::json!({"rows": 3});
        assert_eq!(render_call_result(Some(&result)), r#"{"rows":3}"#);
        assert_eq!(render_call_result(None), "");
    }

    #[tokio::test]
    async fn test_discover_tools_with_no_servers() {
        let config = Config::default();
        let tools = discover_tools(&config).await.unwrap();
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn test_discover_tools_survives_unreachable_server() {
        let mut config = Config::default();
        config.mcp.timeout_seconds = 1;
        config.mcp.servers = vec![McpServerConfig {
            id: "dead".to_string(),
            url: "http://127.0.0.1:9/mcp".to_string(),
        }];

        // 不可达服务器不应令发现流程报错
        let tools = discover_tools(&config).await.unwrap();
        assert!(tools.is_empty());
    }
}
