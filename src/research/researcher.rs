//! 研究单元 - 对单一主题的有界工具调用循环与发现压缩

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::config::ResearchOptions;
use crate::llm::client::{ChatMessage, ModelGateway, ToolCallRequest};
use crate::llm::tools::{ResearchTool, ToolDescriptor};
use crate::research::prompts;
use crate::research::state::{ResearcherOutput, ResearcherState, ResearcherTask};
use crate::utils::messages::{collect_raw_notes, truncate_to_last_assistant};
use crate::utils::sources::normalize_citations;

/// 压缩阶段的最大尝试次数
const MAX_COMPRESSION_ATTEMPTS: usize = 3;

/// 研究单元。
/// 每次run以全新的本地状态执行一个研究子任务，单元之间不共享任何可变状态。
pub struct ResearcherUnit {
    gateway: Arc<dyn ModelGateway>,
    tools: Vec<Arc<dyn ResearchTool>>,
    options: ResearchOptions,
}

impl ResearcherUnit {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        tools: Vec<Arc<dyn ResearchTool>>,
        options: ResearchOptions,
    ) -> Self {
        Self {
            gateway,
            tools,
            options,
        }
    }

    /// 执行一个研究子任务，返回压缩摘要与原始笔记。
    /// 上下文超限不会使整个监督轮次失败，单元返回已有的部分结果。
    pub async fn run(&self, task: &ResearcherTask) -> anyhow::Result<ResearcherOutput> {
        let mut state = ResearcherState {
            messages: vec![ChatMessage::user(task.topic.clone())],
            tool_call_iterations: 0,
            topic: task.topic.clone(),
        };

        let descriptors: Vec<ToolDescriptor> =
            self.tools.iter().map(|tool| tool.descriptor()).collect();
        let system_prompt = prompts::researcher_system_prompt(self.options.max_react_tool_calls);

        loop {
            if state.tool_call_iterations >= self.options.max_react_tool_calls {
                break;
            }

            let turn = match self
                .gateway
                .complete(&system_prompt, &state.messages, &descriptors)
                .await
            {
                Ok(turn) => turn,
                Err(e) if e.is_token_limit() => {
                    // 上下文超限：放弃后续研究，带着已有原始笔记降级返回
                    eprintln!("   ⚠️ 研究单元上下文超限，返回部分结果: {}", e);
                    return Ok(ResearcherOutput {
                        compressed_research: String::new(),
                        raw_notes: vec![collect_raw_notes(&state.messages)],
                    });
                }
                Err(e) => return Err(e.into()),
            };

            state.tool_call_iterations += 1;
            state.messages.push(ChatMessage::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            // 纯文本回复意味着模型认为研究已经充分
            if turn.is_text_only() {
                break;
            }

            // 同一轮请求的工具调用并行执行，结果按原顺序回填
            let observations = join_all(
                turn.tool_calls
                    .iter()
                    .map(|call| self.execute_tool_safely(call)),
            )
            .await;

            for (call, observation) in turn.tool_calls.iter().zip(observations) {
                state
                    .messages
                    .push(ChatMessage::tool_result(&call.id, &call.name, observation));
            }
        }

        let (compressed, raw_notes) = self.compress(&state).await;

        Ok(ResearcherOutput {
            compressed_research: normalize_citations(&compressed),
            raw_notes,
        })
    }

    /// 安全执行单个工具调用。超时与执行错误一律转化为工具结果文本，
    /// 由模型在下一轮自行决定重试、换思路或继续。
    async fn execute_tool_safely(&self, call: &ToolCallRequest) -> String {
        let Some(tool) = self
            .tools
            .iter()
            .find(|tool| tool.descriptor().name == call.name)
        else {
            return format!("未知工具: {}", call.name);
        };

        let timeout = Duration::from_secs(self.options.tool_timeout_seconds);
        match tokio::time::timeout(timeout, tool.call(call.arguments.clone())).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => format!("执行工具错误: {}", e),
            Err(_) => format!("工具执行超时: {}", call.name),
        }
    }

    /// 压缩步骤：将全部原始发现逐字重写为带引用的干净产物。
    /// 上下文超限时丢弃较早消息后重试，重试耗尽返回错误摘要与原始笔记。
    async fn compress(&self, state: &ResearcherState) -> (String, Vec<String>) {
        let raw_notes = vec![collect_raw_notes(&state.messages)];
        let system_prompt = prompts::compress_system_prompt();

        let mut history = state.messages.clone();
        history.push(ChatMessage::user(prompts::COMPRESS_HUMAN_MESSAGE));

        for _attempt in 0..MAX_COMPRESSION_ATTEMPTS {
            match self.gateway.complete(&system_prompt, &history, &[]).await {
                Ok(turn) => return (turn.content, raw_notes),
                Err(e) if e.is_token_limit() => {
                    // 超限后丢弃最后一条助手消息之前的历史再重试；
                    // 若已无可丢弃的前缀则从头部继续收缩
                    history.pop();
                    let mut trimmed = truncate_to_last_assistant(&history);
                    if trimmed.len() == history.len() && !trimmed.is_empty() {
                        trimmed.remove(0);
                    }
                    trimmed.push(ChatMessage::user(prompts::COMPRESS_HUMAN_MESSAGE));
                    history = trimmed;
                }
                Err(_) => continue,
            }
        }

        (
            "错误：压缩研究发现失败，已超过最大重试次数".to_string(),
            raw_notes,
        )
    }
}
