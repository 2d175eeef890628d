//! 深度研究编排器 - 澄清 → 简报 → 监督 → 综合 的固定四阶段流水线

use std::sync::Arc;

use crate::config::Config;
use crate::llm::client::{ChatMessage, ModelGateway};
use crate::llm::tools::{ResearchTool, ToolRole, tools_for_role};
use crate::progress::{ProgressEvent, ProgressSink, ProgressStage};
use crate::research::prompts;
use crate::research::state::{ResearchBrief, ResearchOutcome};
use crate::research::supervisor::SupervisorLoop;
use crate::research::synthesizer::ReportSynthesizer;
use crate::utils::messages::{has_assistant_reply, render_buffer};

/// 深度研究编排器。
/// 由宿主进程显式构造一次并注入请求处理层，组件之间没有隐藏的全局实例。
/// 研究工具集在构造时解析完成，之后的每次run不再做工具发现。
pub struct DeepResearchOrchestrator {
    gateway: Arc<dyn ModelGateway>,
    config: Config,
    researcher_tools: Vec<Arc<dyn ResearchTool>>,
    progress: ProgressSink,
}

impl DeepResearchOrchestrator {
    /// 构造编排器并完成工具发现
    pub async fn new(config: Config, gateway: Arc<dyn ModelGateway>, progress: ProgressSink) -> Self {
        let researcher_tools = tools_for_role(ToolRole::Researcher, &config).await;
        Self::with_tools(config, gateway, researcher_tools, progress)
    }

    /// 以既有工具集构造编排器
    pub fn with_tools(
        config: Config,
        gateway: Arc<dyn ModelGateway>,
        researcher_tools: Vec<Arc<dyn ResearchTool>>,
        progress: ProgressSink,
    ) -> Self {
        Self {
            gateway,
            config,
            researcher_tools,
            progress,
        }
    }

    /// 执行完整研究流水线。
    /// 澄清阶段可能提前返回澄清问题；阶段2-4的不可恢复错误一律
    /// 转化为部分结果返回，调用方永远收到结构良好的结果。
    pub async fn run(&self, user_messages: &[ChatMessage]) -> ResearchOutcome {
        // ─── 阶段1：澄清 ───
        // 同一逻辑会话中澄清问题至多问一次：历史中已有助手回复
        // （即此前发出的澄清问题）时直接跳过本阶段
        if self.config.research.allow_clarification && !has_assistant_reply(user_messages) {
            (self.progress)(ProgressEvent::new(
                ProgressStage::Clarifying,
                0.0,
                "检查问题是否需要澄清",
            ));

            let clarify_prompt = prompts::clarify_prompt(&render_buffer(user_messages));
            match self.gateway.clarify(&clarify_prompt).await {
                Ok(decision) if decision.need_clarification => {
                    println!("   ❓ 需要澄清，返回澄清问题");
                    return ResearchOutcome::Clarification {
                        question: decision.question,
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    // 澄清判定失败不阻塞研究，直接进入简报阶段
                    eprintln!("   ⚠️ 澄清阶段出错，继续研究规划: {}", e);
                }
            }
        }

        // ─── 阶段2：简报 ───
        (self.progress)(ProgressEvent::new(
            ProgressStage::Planning,
            5.0,
            "规划研究策略",
        ));

        let brief_prompt = prompts::brief_prompt(&render_buffer(user_messages));
        let brief = match self.gateway.write_brief(&brief_prompt).await {
            Ok(draft) => ResearchBrief::new(draft.research_brief),
            Err(e) => {
                eprintln!("   ❌ 研究简报生成失败: {}", e);
                return ResearchOutcome::Report {
                    final_report: format!("生成研究简报错误: {}", e),
                    notes: Vec::new(),
                    research_brief: String::new(),
                };
            }
        };

        (self.progress)(ProgressEvent::new(
            ProgressStage::Planning,
            15.0,
            "研究简报已生成",
        ));

        // ─── 阶段3：监督 ───
        let supervisor = SupervisorLoop::new(
            self.gateway.clone(),
            self.researcher_tools.clone(),
            self.config.research.clone(),
            self.progress.clone(),
        );
        let supervisor_state = supervisor.run(&brief).await;

        // ─── 阶段4：综合 ───
        (self.progress)(ProgressEvent::new(
            ProgressStage::GeneratingReport,
            75.0,
            "生成最终报告",
        ));

        let synthesizer = ReportSynthesizer::new(self.gateway.clone());
        let final_report = match synthesizer
            .run(&brief, &supervisor_state.notes, user_messages)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                // 报告生成失败时返回部分结果：简报与已聚合的发现仍然交付
                eprintln!("   ❌ 最终报告生成失败: {}", e);
                format!("生成最终报告错误: {}", e)
            }
        };

        (self.progress)(ProgressEvent::new(
            ProgressStage::Completed,
            100.0,
            "研究任务完成",
        ));

        ResearchOutcome::Report {
            final_report,
            notes: supervisor_state.notes,
            research_brief: brief.into_string(),
        }
    }
}
