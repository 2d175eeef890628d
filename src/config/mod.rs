use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 搜索API提供商
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum SearchProvider {
    #[serde(rename = "serper")]
    #[default]
    Serper,
    #[serde(rename = "tavily")]
    Tavily,
    #[serde(rename = "none")]
    None,
}

impl std::fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchProvider::Serper => write!(f, "serper"),
            SearchProvider::Tavily => write!(f, "tavily"),
            SearchProvider::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serper" => Ok(SearchProvider::Serper),
            "tavily" => Ok(SearchProvider::Tavily),
            "none" => Ok(SearchProvider::None),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// 研究编排配置
    #[serde(default)]
    pub research: ResearchOptions,

    /// LLM模型配置
    #[serde(default)]
    pub llm: LLMConfig,

    /// 搜索工具配置
    #[serde(default)]
    pub search: SearchConfig,

    /// MCP工具源配置
    #[serde(default)]
    pub mcp: McpConfig,

    /// 是否启用详细日志
    #[serde(default)]
    pub verbose: bool,
}

/// 研究编排配置 - 监督者与研究单元的预算控制
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResearchOptions {
    /// 最大并发研究单元数。同一轮中超出的委托会被显式拒绝
    pub max_concurrent_research_units: usize,

    /// 研究监督者的最大规划迭代次数
    pub max_researcher_iterations: usize,

    /// 单个研究单元内的最大工具调用迭代次数
    pub max_react_tool_calls: usize,

    /// 是否允许在研究开始前向用户提出澄清问题
    pub allow_clarification: bool,

    /// 搜索API提供商
    pub search_provider: SearchProvider,

    /// 要集成的MCP服务器ID列表，为空表示集成所有已配置服务器
    pub mcp_server_ids: Vec<String>,

    /// 单次工具执行的超时时间（秒）
    pub tool_timeout_seconds: u64,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            max_concurrent_research_units: 3,
            max_researcher_iterations: 3,
            max_react_tool_calls: 5,
            allow_clarification: true,
            search_provider: SearchProvider::default(),
            mcp_server_ids: Vec::new(),
            tool_timeout_seconds: 30,
        }
    }
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，优先用于监督决策、研究单元与压缩等常规推理任务
    pub model_efficient: String,

    /// 高质量模型，用于最终报告综合等复杂推理任务
    pub model_powerful: String,

    /// 最大输出tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("DEEPRESEARCH_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api-inference.modelscope.cn/v1"),
            model_efficient: String::from("Qwen/Qwen3-Next-80B-A3B-Instruct"),
            model_powerful: String::from("Qwen/Qwen3-235B-A22B-Instruct-2507"),
            max_tokens: 8192,
            temperature: 0.1,
            retry_attempts: 3,
            retry_delay_ms: 5000,
            timeout_seconds: 300,
        }
    }
}

/// 搜索工具配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Serper API KEY
    pub serper_api_key: String,

    /// Tavily API KEY
    pub tavily_api_key: String,

    /// 每次搜索返回的最大结果数
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: std::env::var("SERPER_API_KEY").unwrap_or_default(),
            tavily_api_key: std::env::var("TAVILY_API_KEY").unwrap_or_default(),
            max_results: 5,
        }
    }
}

/// MCP服务器配置项
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct McpServerConfig {
    /// 服务器标识，用于 research.mcp_server_ids 过滤
    pub id: String,

    /// 服务器地址（streamable http传输）
    pub url: String,
}

/// MCP工具源配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McpConfig {
    /// 是否启用MCP工具集成
    pub enabled: bool,

    /// MCP服务器列表
    pub servers: Vec<McpServerConfig>,

    /// MCP服务器连接超时时间（秒）
    pub timeout_seconds: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: Vec::new(),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 过滤后的MCP服务器列表。
    /// mcp_server_ids为空时返回所有已配置服务器。
    pub fn enabled_mcp_servers(&self) -> Vec<McpServerConfig> {
        if !self.mcp.enabled {
            return Vec::new();
        }
        if self.research.mcp_server_ids.is_empty() {
            return self.mcp.servers.clone();
        }
        self.mcp
            .servers
            .iter()
            .filter(|server| self.research.mcp_server_ids.contains(&server.id))
            .cloned()
            .collect()
    }
}
