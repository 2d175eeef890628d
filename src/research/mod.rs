// 深度研究编排核心
// Orchestrator（根） = 澄清 → 简报 → 监督 → 综合 的固定流水线，外层HTTP只与它交互
// SupervisorLoop（循环） = 每轮决定 委托研究 / 反思 / 宣告完成，机械执行并发上限与迭代预算
// ResearcherUnit（叶） = 单主题的有界工具调用循环 + 压缩，状态严格隔离、可安全并行
// ReportSynthesizer（尾） = 以用户输入语言综合带引用的最终报告

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::client::{ChatMessage, LLMClient};
use crate::progress;

pub mod orchestrator;
pub mod prompts;
pub mod researcher;
pub mod state;
pub mod supervisor;
pub mod synthesizer;

pub use orchestrator::DeepResearchOrchestrator;
pub use state::ResearchOutcome;

/// 以给定问题启动一次完整的深度研究流程
pub async fn launch(config: &Config, question: &str) -> Result<ResearchOutcome> {
    let gateway = Arc::new(LLMClient::new(config.clone())?);
    let orchestrator =
        DeepResearchOrchestrator::new(config.clone(), gateway, progress::console_sink()).await;

    println!("🚀 开始执行深度研究: {}", question);
    let outcome = orchestrator
        .run(&[ChatMessage::user(question.to_string())])
        .await;
    println!("✓ 深度研究流程执行完毕");

    Ok(outcome)
}
