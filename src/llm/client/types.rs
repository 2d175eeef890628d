//! 网关核心类型 - 统一消息表示、模型回合与错误分类

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 对话消息 - 编排核心与模型网关之间的统一消息表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatMessage {
    /// 用户消息
    User { content: String },
    /// 助手消息，可能携带工具调用请求
    Assistant {
        content: String,
        tool_calls: Vec<ToolCallRequest>,
    },
    /// 工具执行结果，通过call_id与发起的调用关联
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        ChatMessage::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }
}

/// 工具调用请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// 调用id，用于将工具结果关联回本次请求
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// 模型单轮输出 - 文本回复或一组工具调用请求
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// 是否为纯文本回复（不含任何工具调用）
    pub fn is_text_only(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// 网关错误分类
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 模型上下文超限 - 调用方据此降级处理而非整体失败
    #[error("模型上下文超限: {0}")]
    TokenLimit(String),
    /// 其它模型服务错误
    #[error("模型服务调用失败: {0}")]
    Provider(String),
}

impl GatewayError {
    /// 从provider返回的错误信息构造，自动识别token超限类错误
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_token_limit_message(&message) {
            GatewayError::TokenLimit(message)
        } else {
            GatewayError::Provider(message)
        }
    }

    pub fn is_token_limit(&self) -> bool {
        matches!(self, GatewayError::TokenLimit(_))
    }
}

/// 依据错误信息判断是否为上下文超限类错误
fn is_token_limit_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    [
        "token limit",
        "context length",
        "maximum context",
        "too many tokens",
        "token count",
        "context window",
        "prompt is too long",
    ]
    .iter()
    .any(|indicator| lowered.contains(indicator))
}

/// 已知模型的上下文长度（token数），未知模型返回None
pub fn model_token_limit(model: &str) -> Option<usize> {
    let limits: &[(&str, usize)] = &[
        ("qwen-turbo", 30_000),
        ("qwen-plus", 30_000),
        ("qwen-max", 30_000),
        ("Qwen/Qwen3-Next-80B-A3B-Instruct", 128_000),
        ("Qwen/Qwen3-235B-A22B-Instruct-2507", 128_000),
        ("gpt-4o", 128_000),
        ("gpt-4o-mini", 128_000),
        ("deepseek-chat", 64_000),
        ("deepseek-reasoner", 64_000),
        ("kimi-k2-0711-preview", 128_000),
        ("claude-3-5-sonnet", 200_000),
        ("claude-3-5-haiku", 200_000),
    ];

    limits
        .iter()
        .find(|(name, _)| model == *name || model.contains(name))
        .map(|(_, limit)| *limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_limit_classification() {
        assert!(GatewayError::from_message("Request exceeds context length of model").is_token_limit());
        assert!(GatewayError::from_message("too many tokens in prompt").is_token_limit());
        assert!(!GatewayError::from_message("connection reset by peer").is_token_limit());
    }

    #[test]
    fn test_model_token_limit_lookup() {
        assert_eq!(model_token_limit("qwen-plus"), Some(30_000));
        assert_eq!(model_token_limit("claude-3-5-sonnet-20241022"), Some(200_000));
        assert_eq!(model_token_limit("some-unknown-model"), None);
    }

    #[test]
    fn test_model_turn_text_only() {
        assert!(ModelTurn::text("done").is_text_only());

        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "c1".into(),
                name: "think".into(),
                arguments: serde_json::json!({}),
            }],
        };
        assert!(!turn.is_text_only());
    }
}
