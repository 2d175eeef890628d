//! 反思工具 - 纯思考记录，无任何执行副作用

use async_trait::async_trait;
use serde::Deserialize;

use super::{ResearchTool, ToolDescriptor, ToolError};

/// 反思工具。
/// 调用本身不触发任何外部动作，返回的确认文本会被记录进调用方的
/// 消息历史，作为模型下一轮决策的上下文。
pub struct ThinkTool;

#[derive(Debug, Deserialize)]
struct ThinkArgs {
    reflection: String,
}

#[async_trait]
impl ResearchTool for ThinkTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "think".to_string(),
            description: "对当前研究进展进行策略性反思：已获得哪些信息、还缺少什么、下一步怎么做。本工具不执行任何外部操作。".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "reflection": {
                        "type": "string",
                        "description": "对研究进展与下一步决策的详细反思"
                    }
                },
                "required": ["reflection"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: ThinkArgs =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        Ok(format!("反思已记录: {}", args.reflection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_think_tool_acknowledges() {
        let tool = ThinkTool;
        let output = tool
            .call(serde_json::json!({"reflection": "已有两个来源，可以停止搜索"}))
            .await
            .unwrap();
        assert!(output.contains("反思已记录"));
        assert!(output.contains("两个来源"));
    }

    #[tokio::test]
    async fn test_think_tool_rejects_missing_args() {
        let tool = ThinkTool;
        let result = tool.call(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArgs(_))));
    }
}
