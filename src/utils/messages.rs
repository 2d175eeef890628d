//! 消息历史工具函数

use crate::llm::client::ChatMessage;

/// 将消息历史渲染为可嵌入提示词的文本
pub fn render_buffer(messages: &[ChatMessage]) -> String {
    let mut buffer = String::new();
    for message in messages {
        match message {
            ChatMessage::User { content } => {
                buffer.push_str(&format!("用户: {}\n", content));
            }
            ChatMessage::Assistant { content, tool_calls } => {
                if !content.is_empty() {
                    buffer.push_str(&format!("助手: {}\n", content));
                }
                for call in tool_calls {
                    buffer.push_str(&format!("助手(工具调用): {}({})\n", call.name, call.arguments));
                }
            }
            ChatMessage::ToolResult { name, content, .. } => {
                buffer.push_str(&format!("工具[{}]: {}\n", name, content));
            }
        }
    }
    buffer
}

/// 消息历史中是否已出现过助手回复。
/// 研究开始前流水线产生的唯一助手消息就是澄清问题本身，
/// 因此该判定用于阻止同一会话内重复澄清。
pub fn has_assistant_reply(messages: &[ChatMessage]) -> bool {
    messages
        .iter()
        .any(|m| matches!(m, ChatMessage::Assistant { .. }))
}

/// 截断到最后一条助手消息（含）之后的历史。
/// 压缩阶段遇到上下文超限时，以此丢弃更早的消息后重试。
pub fn truncate_to_last_assistant(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    for (index, message) in messages.iter().enumerate().rev() {
        if matches!(message, ChatMessage::Assistant { .. }) {
            return messages[index..].to_vec();
        }
    }
    messages.to_vec()
}

/// 从消息历史中收集原始研究笔记（助手输出与工具结果）
pub fn collect_raw_notes(messages: &[ChatMessage]) -> String {
    let mut notes = Vec::new();
    for message in messages {
        match message {
            ChatMessage::Assistant { content, .. } if !content.is_empty() => {
                notes.push(content.clone());
            }
            ChatMessage::ToolResult { content, .. } => {
                notes.push(content.clone());
            }
            _ => {}
        }
    }
    notes.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::ToolCallRequest;

    #[test]
    fn test_render_buffer() {
        let messages = vec![
            ChatMessage::user("问题"),
            ChatMessage::assistant("回答"),
            ChatMessage::tool_result("c1", "search", "结果"),
        ];
        let buffer = render_buffer(&messages);
        assert!(buffer.contains("用户: 问题"));
        assert!(buffer.contains("助手: 回答"));
        assert!(buffer.contains("工具[search]: 结果"));
    }

    #[test]
    fn test_has_assistant_reply() {
        assert!(!has_assistant_reply(&[ChatMessage::user("q")]));
        assert!(has_assistant_reply(&[
            ChatMessage::user("q"),
            ChatMessage::assistant("您想研究哪个方面？"),
        ]));
    }

    #[test]
    fn test_truncate_to_last_assistant() {
        let messages = vec![
            ChatMessage::user("q"),
            ChatMessage::assistant("第一轮"),
            ChatMessage::tool_result("c1", "search", "结果1"),
            ChatMessage::Assistant {
                content: "第二轮".into(),
                tool_calls: vec![ToolCallRequest {
                    id: "c2".into(),
                    name: "search".into(),
                    arguments: serde_json::json!({"query": "x"}),
                }],
            },
            ChatMessage::tool_result("c2", "search", "结果2"),
        ];

        let truncated = truncate_to_last_assistant(&messages);
        assert_eq!(truncated.len(), 2);
        assert!(matches!(&truncated[0], ChatMessage::Assistant { content, .. } if content == "第二轮"));
    }

    #[test]
    fn test_truncate_without_assistant_keeps_all() {
        let messages = vec![ChatMessage::user("q")];
        assert_eq!(truncate_to_last_assistant(&messages).len(), 1);
    }

    #[test]
    fn test_collect_raw_notes() {
        let messages = vec![
            ChatMessage::user("主题"),
            ChatMessage::assistant("分析"),
            ChatMessage::tool_result("c1", "search", "来源内容"),
        ];
        let notes = collect_raw_notes(&messages);
        assert!(notes.contains("分析"));
        assert!(notes.contains("来源内容"));
        assert!(!notes.contains("主题"));
    }
}
