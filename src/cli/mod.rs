use crate::config::{Config, LLMProvider, SearchProvider};
use clap::Parser;
use std::path::PathBuf;

/// DeepResearch-RS - 由Rust与AI驱动的深度研究引擎
#[derive(Parser, Debug)]
#[command(name = "deepresearch-rs")]
#[command(
    about = "AI-based deep research orchestration engine. It decomposes a research question into parallel sub-research tasks, enforces iteration and concurrency budgets, and synthesizes a citation-annotated final report."
)]
#[command(author = "Sopaco")]
#[command(version)]
pub struct Args {
    /// 研究问题
    pub question: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 最大并发研究单元数
    #[arg(long)]
    pub max_concurrent_research_units: Option<usize>,

    /// 监督者最大规划迭代次数
    #[arg(long)]
    pub max_researcher_iterations: Option<usize>,

    /// 单个研究单元的最大工具调用迭代次数
    #[arg(long)]
    pub max_react_tool_calls: Option<usize>,

    /// 禁用研究前的澄清询问
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub no_clarification: bool,

    /// 搜索提供商 (serper, tavily, none)
    #[arg(long)]
    pub search_provider: Option<String>,

    /// 要集成的MCP服务器ID（可多次指定）
    #[arg(long)]
    pub mcp_server_id: Vec<String>,

    /// LLM Provider (openai, moonshot, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 高能效模型，优先用于监督决策与研究单元推理
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，优先用于最终报告综合
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 最大输出tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Config {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定配置文件路径时必须可读
            Config::from_file(config_path).unwrap_or_else(|_| {
                panic!("⚠️ 警告: 无法读取配置文件 {:?}", config_path)
            })
        } else {
            // 尝试从默认位置加载
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| std::path::PathBuf::from("."))
                .join("deepresearch.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path).unwrap_or_else(|_| {
                    panic!(
                        "⚠️ 警告: 无法读取默认配置文件 {:?}",
                        default_config_path
                    )
                })
            } else {
                Config::default()
            }
        };

        // 覆盖研究预算配置
        if let Some(units) = self.max_concurrent_research_units {
            config.research.max_concurrent_research_units = units;
        }
        if let Some(iterations) = self.max_researcher_iterations {
            config.research.max_researcher_iterations = iterations;
        }
        if let Some(tool_calls) = self.max_react_tool_calls {
            config.research.max_react_tool_calls = tool_calls;
        }
        if self.no_clarification {
            config.research.allow_clarification = false;
        }
        if let Some(provider_str) = self.search_provider {
            if let Ok(provider) = provider_str.parse::<SearchProvider>() {
                config.research.search_provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的搜索提供商: {}，使用默认提供商",
                    provider_str
                );
            }
        }
        if !self.mcp_server_id.is_empty() {
            config.research.mcp_server_ids = self.mcp_server_id;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        } else if config.llm.model_powerful.is_empty() {
            config.llm.model_powerful = config.llm.model_efficient.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        config.verbose = self.verbose;

        config
    }
}

// Include tests
#[cfg(test)]
mod tests;
