//! LLM Provider支持模块

use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel, ToolDefinition};
use rig::extractor::Extractor;
use rig::message::Message;
use rig::one_or_many::OneOrMany;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{GatewayError, ModelTurn, ToolCallRequest};
use crate::config::{LLMConfig, LLMProvider};

/// 一次对话补全请求的全部要素
pub(crate) struct ChatRequest {
    pub system: String,
    pub prompt: Message,
    pub history: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Moonshot(rig::providers::moonshot::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> anyhow::Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Moonshot => {
                let client = rig::providers::moonshot::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::Moonshot(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 执行一次对话补全，返回文本回复或工具调用请求
    pub(crate) async fn chat(
        &self,
        model: &str,
        request: ChatRequest,
    ) -> Result<ModelTurn, GatewayError> {
        match self {
            ProviderClient::OpenAI(client) => {
                chat_with(&client.completion_model(model).completions_api(), request).await
            }
            ProviderClient::Moonshot(client) => {
                chat_with(&client.completion_model(model), request).await
            }
            ProviderClient::DeepSeek(client) => {
                chat_with(&client.completion_model(model), request).await
            }
            ProviderClient::OpenRouter(client) => {
                chat_with(&client.completion_model(model), request).await
            }
            ProviderClient::Anthropic(client) => {
                chat_with(&client.completion_model(model), request).await
            }
            ProviderClient::Ollama(client) => {
                chat_with(&client.completion_model(model), request).await
            }
        }
    }

    /// 创建Extractor
    pub(crate) fn create_extractor<T>(
        &self,
        model: &str,
        system_prompt: &str,
        config: &LLMConfig,
    ) -> ProviderExtractor<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        match self {
            ProviderClient::OpenAI(client) => {
                let extractor = client
                    .extractor_completions_api::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::OpenAI(extractor)
            }
            ProviderClient::Moonshot(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Moonshot(extractor)
            }
            ProviderClient::DeepSeek(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::DeepSeek(extractor)
            }
            ProviderClient::OpenRouter(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::OpenRouter(extractor)
            }
            ProviderClient::Anthropic(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Anthropic(extractor)
            }
            ProviderClient::Ollama(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Ollama(extractor)
            }
        }
    }
}

/// 以任意rig补全模型执行对话请求
async fn chat_with<M>(model: &M, request: ChatRequest) -> Result<ModelTurn, GatewayError>
where
    M: CompletionModel,
{
    let mut builder = model
        .completion_request(request.prompt)
        .preamble(request.system)
        .messages(request.history)
        .temperature(request.temperature)
        .max_tokens(request.max_tokens);

    if !request.tools.is_empty() {
        builder = builder.tools(request.tools);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| GatewayError::from_message(e.to_string()))?;

    Ok(turn_from_contents(response.choice))
}

/// 将模型回复内容转换为统一的ModelTurn
fn turn_from_contents(choice: OneOrMany<AssistantContent>) -> ModelTurn {
    let mut turn = ModelTurn::default();

    for content in choice.iter() {
        match content {
            AssistantContent::Text(text) => {
                if !turn.content.is_empty() {
                    turn.content.push('\n');
                }
                turn.content.push_str(&text.text);
            }
            AssistantContent::ToolCall(tool_call) => {
                let id = if tool_call.id.is_empty() {
                    uuid::Uuid::new_v4().to_string()
                } else {
                    tool_call.id.clone()
                };
                turn.tool_calls.push(ToolCallRequest {
                    id,
                    name: tool_call.function.name.clone(),
                    arguments: tool_call.function.arguments.clone(),
                });
            }
            AssistantContent::Reasoning(_) => {}
        }
    }

    turn
}

/// 统一的Extractor枚举
pub enum ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    OpenAI(Extractor<rig::providers::openai::CompletionModel, T>),
    Moonshot(Extractor<rig::providers::moonshot::CompletionModel, T>),
    DeepSeek(Extractor<rig::providers::deepseek::CompletionModel, T>),
    OpenRouter(Extractor<rig::providers::openrouter::CompletionModel, T>),
    Anthropic(Extractor<rig::providers::anthropic::completion::CompletionModel, T>),
    Ollama(Extractor<rig::providers::ollama::CompletionModel<reqwest::Client>, T>),
}

impl<T> ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    /// 执行提取
    pub async fn extract(&self, prompt: &str) -> Result<T, GatewayError> {
        match self {
            ProviderExtractor::OpenAI(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
            ProviderExtractor::Moonshot(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
            ProviderExtractor::DeepSeek(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
            ProviderExtractor::OpenRouter(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
            ProviderExtractor::Anthropic(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
            ProviderExtractor::Ollama(extractor) => extractor
                .extract(prompt)
                .await
                .map_err(|e| GatewayError::from_message(e.to_string())),
        }
    }
}
