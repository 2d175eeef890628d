//! LLM客户端 - 模型网关的统一实现

use async_trait::async_trait;
use rig::completion::AssistantContent;
use rig::message::{Message, ToolCall, ToolFunction, ToolResultContent, UserContent};
use rig::one_or_many::OneOrMany;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;

mod providers;
pub mod types;

pub use types::{ChatMessage, GatewayError, ModelTurn, ToolCallRequest, model_token_limit};

use providers::{ChatRequest, ProviderClient};

use crate::config::Config;
use crate::llm::tools::ToolDescriptor;
use crate::research::state::{BriefDraft, ClarifyDecision};

/// 模型网关能力契约 - 编排核心依赖的唯一模型接口。
/// 宿主进程构造一次具体实现并注入编排器，核心不持有任何全局单例。
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// 带工具绑定的对话补全。tools为空时退化为普通对话。
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelTurn, GatewayError>;

    /// 单轮长文推理，用于最终报告综合
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String, GatewayError>;

    /// 澄清判定（结构化输出）
    async fn clarify(&self, prompt: &str) -> Result<ClarifyDecision, GatewayError>;

    /// 研究简报生成（结构化输出）
    async fn write_brief(&self, prompt: &str) -> Result<BriefDraft, GatewayError>;

    /// 报告模型的已知上下文长度（tokens），未知返回None
    fn context_window(&self) -> Option<usize> {
        None
    }
}

/// LLM客户端 - 基于rig多Provider实现的模型网关
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑。上下文超限错误不重试，直接上抛由调用方降级处理。
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let llm_config = &self.config.llm;
        let max_retries = llm_config.retry_attempts;
        let retry_delay_ms = llm_config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_token_limit() => return Err(err),
                Err(err) => {
                    retries += 1;
                    eprintln!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 数据提取方法
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T, GatewayError>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let llm_config = &self.config.llm;
        let extractor = self.client.create_extractor::<T>(
            &llm_config.model_efficient,
            system_prompt,
            llm_config,
        );

        self.retry_with_backoff(|| async { extractor.extract(user_prompt).await })
            .await
    }

    /// 以给定模型执行一次对话补全
    async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelTurn, GatewayError> {
        let llm_config = &self.config.llm;
        let tool_definitions: Vec<_> = tools.iter().map(|t| t.to_rig_definition()).collect();

        self.retry_with_backoff(|| async {
            let mut rig_history = to_rig_messages(history);
            let prompt = rig_history.pop().unwrap_or_else(|| Message::user(""));

            self.client
                .chat(
                    model,
                    ChatRequest {
                        system: system_prompt.to_string(),
                        prompt,
                        history: rig_history,
                        tools: tool_definitions.clone(),
                        temperature: llm_config.temperature,
                        max_tokens: llm_config.max_tokens.into(),
                    },
                )
                .await
        })
        .await
    }
}

#[async_trait]
impl ModelGateway for LLMClient {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelTurn, GatewayError> {
        self.chat(
            &self.config.llm.model_efficient,
            system_prompt,
            history,
            tools,
        )
        .await
    }

    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String, GatewayError> {
        // 报告综合使用高质量模型
        let turn = self
            .chat(
                &self.config.llm.model_powerful,
                system_prompt,
                &[ChatMessage::user(user_prompt)],
                &[],
            )
            .await?;
        Ok(turn.content)
    }

    async fn clarify(&self, prompt: &str) -> Result<ClarifyDecision, GatewayError> {
        self.extract::<ClarifyDecision>(
            "你是研究助理，负责判断用户请求是否需要澄清。",
            prompt,
        )
        .await
    }

    async fn write_brief(&self, prompt: &str) -> Result<BriefDraft, GatewayError> {
        self.extract::<BriefDraft>(
            "你是研究助理，负责将对话转写为结构化研究简报。",
            prompt,
        )
        .await
    }

    fn context_window(&self) -> Option<usize> {
        model_token_limit(&self.config.llm.model_powerful)
    }
}

/// 将统一消息表示转换为rig消息序列
fn to_rig_messages(history: &[ChatMessage]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len());

    for message in history {
        match message {
            ChatMessage::User { content } => {
                messages.push(Message::user(content.clone()));
            }
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut contents: Vec<AssistantContent> = Vec::new();
                if !content.is_empty() {
                    contents.push(AssistantContent::text(content.clone()));
                }
                for call in tool_calls {
                    contents.push(AssistantContent::ToolCall(ToolCall {
                        id: call.id.clone(),
                        call_id: None,
                        function: ToolFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    }));
                }
                match OneOrMany::many(contents) {
                    Ok(content) => messages.push(Message::Assistant { id: None, content }),
                    // 空的助手消息对补全无意义，直接跳过
                    Err(_) => continue,
                }
            }
            ChatMessage::ToolResult {
                call_id, content, ..
            } => {
                messages.push(Message::User {
                    content: OneOrMany::one(UserContent::tool_result(
                        call_id.clone(),
                        OneOrMany::one(ToolResultContent::text(content.clone())),
                    )),
                });
            }
        }
    }

    messages
}
