//! 研究状态定义 - 各组件独占持有的状态对象与结构化模型输出

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::llm::client::ChatMessage;

/// 研究简报 - 由简报阶段一次性派生，请求生命周期内只读
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchBrief {
    text: String,
}

impl ResearchBrief {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// 澄清判定（结构化输出）
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClarifyDecision {
    /// 是否需要向用户询问澄清问题
    pub need_clarification: bool,
    /// 向用户询问以澄清研究范围的问题
    pub question: String,
    /// 不需要澄清时的确认消息，表示将基于已有信息开始研究
    pub verification: String,
}

/// 研究简报草案（结构化输出）
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BriefDraft {
    /// 用于指导研究的研究问题，第一人称、最大化具体
    pub research_brief: String,
}

/// 监督者阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorPhase {
    /// 规划中 - 等待模型给出下一步行动
    #[default]
    Planning,
    /// 委托中 - 本轮接受的研究单元正在并行执行
    Delegating,
    /// 研究完成（终态）
    Complete,
    /// 预算耗尽或致命错误导致的提前终止（终态）
    Aborted,
}

impl SupervisorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorPhase::Complete | SupervisorPhase::Aborted)
    }
}

/// 监督者状态 - 仅由监督者循环这一逻辑控制线程修改。
/// 子研究单元从不直接写入该状态，结果统一由监督者合并。
#[derive(Debug, Default)]
pub struct SupervisorState {
    /// 与模型交换的消息历史（只追加）
    pub messages: Vec<ChatMessage>,
    /// 压缩后的研究发现（只追加）
    pub notes: Vec<String>,
    /// 原始研究笔记，保留研究过程留痕（只追加）
    pub raw_notes: Vec<String>,
    /// 规划迭代计数，单调递增
    pub iterations: usize,
    /// 当前阶段
    pub phase: SupervisorPhase,
}

/// 研究子任务 - 由监督者的一次委托创建，恰好被一个研究单元消费。
/// call_id用于将结果关联回发起委托的那次工具调用。
#[derive(Debug, Clone, PartialEq)]
pub struct ResearcherTask {
    pub call_id: String,
    pub topic: String,
}

/// 研究单元状态 - 严格限定在单个研究单元内部，单元之间互不可见
#[derive(Debug, Default)]
pub struct ResearcherState {
    /// 单元本地消息历史
    pub messages: Vec<ChatMessage>,
    /// 工具调用迭代计数
    pub tool_call_iterations: usize,
    /// 研究主题
    pub topic: String,
}

/// 研究单元输出
#[derive(Debug, Clone, Default)]
pub struct ResearcherOutput {
    /// 压缩后的研究摘要，带内联引用与来源列表
    pub compressed_research: String,
    /// 原始笔记
    pub raw_notes: Vec<String>,
}

/// 编排结果 - 调用方收到的结构化最终产物
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    /// 请求欠明确，需要用户补充信息后重新提交
    Clarification { question: String },
    /// 研究完成（可能经过降级，notes少于预期）
    Report {
        final_report: String,
        notes: Vec<String>,
        research_brief: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_phase_terminal() {
        assert!(!SupervisorPhase::Planning.is_terminal());
        assert!(!SupervisorPhase::Delegating.is_terminal());
        assert!(SupervisorPhase::Complete.is_terminal());
        assert!(SupervisorPhase::Aborted.is_terminal());
    }

    #[test]
    fn test_brief_is_immutable_value() {
        let brief = ResearchBrief::new("研究问题");
        assert_eq!(brief.as_str(), "研究问题");
        assert_eq!(brief.clone().into_string(), "研究问题");
    }
}
