//! 报告综合器 - 将研究简报与聚合发现综合为最终报告

use std::sync::Arc;

use crate::i18n::ReportLanguage;
use crate::llm::client::{ChatMessage, ModelGateway};
use crate::research::prompts;
use crate::research::state::ResearchBrief;
use crate::utils::messages::render_buffer;
use crate::utils::sources::normalize_citations;
use crate::utils::token_estimator::{TokenEstimator, truncate_to_chars};

/// 上下文超限后的最大重试次数
const MAX_TRUNCATION_RETRIES: usize = 3;

const SYNTHESIZER_SYSTEM_PROMPT: &str =
    "你是研究报告撰写专家，基于研究发现撰写全面、引用严谨的深度研究报告。";

/// 报告综合器。
/// 单次模型调用产出最终报告；上下文超限时按预算逐步截断发现并重试。
pub struct ReportSynthesizer {
    gateway: Arc<dyn ModelGateway>,
}

impl ReportSynthesizer {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// 生成最终报告。
    /// 输出语言依据人类消息历史检测，而非研究简报——简报可能已被规范化。
    pub async fn run(
        &self,
        brief: &ResearchBrief,
        notes: &[String],
        user_messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        let language = ReportLanguage::detect_from_messages(user_messages);
        let messages_buffer = render_buffer(user_messages);
        let estimator = TokenEstimator::new();

        let mut findings = notes.join("\n");
        let mut char_budget: Option<usize> = None;

        for _retry in 0..=MAX_TRUNCATION_RETRIES {
            let prompt =
                prompts::final_report_prompt(brief.as_str(), &messages_buffer, &findings, language);

            match self.gateway.prompt(SYNTHESIZER_SYSTEM_PROMPT, &prompt).await {
                Ok(report) => return Ok(normalize_citations(&report)),
                Err(e) if e.is_token_limit() => {
                    char_budget = match char_budget {
                        None => {
                            // 首次超限：从模型已知上下文推导字符预算
                            let Some(window) = self.gateway.context_window() else {
                                anyhow::bail!(
                                    "生成最终报告错误：上下文超限，且无法确定模型的最大上下文长度。{}",
                                    e
                                );
                            };
                            Some(estimator.char_budget(window))
                        }
                        // 后续超限：每次再收缩10%
                        Some(budget) => Some(budget * 9 / 10),
                    };

                    if let Some(budget) = char_budget {
                        findings = truncate_to_chars(&findings, budget);
                        println!("   📉 发现内容超限，截断至 {} 字符后重试", budget);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        anyhow::bail!("生成最终报告错误：超过最大重试次数")
    }
}
