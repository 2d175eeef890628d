//! 研究进度事件 - 编排核心通过回调向外层上报阶段进展

use std::sync::Arc;

/// 研究阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// 检查问题是否需要澄清
    Clarifying,
    /// 规划研究策略（生成研究简报）
    Planning,
    /// 监督者研究编排
    Supervising,
    /// 启动研究单元
    Delegating,
    /// 研究单元执行中
    Researching,
    /// 生成最终报告
    GeneratingReport,
    /// 研究任务完成
    Completed,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Clarifying => "clarifying",
            ProgressStage::Planning => "planning",
            ProgressStage::Supervising => "supervising",
            ProgressStage::Delegating => "delegating",
            ProgressStage::Researching => "researching",
            ProgressStage::GeneratingReport => "generating_report",
            ProgressStage::Completed => "completed",
        }
    }
}

/// 进度事件
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// 整体进度百分比（0-100）
    pub percent: f32,
    /// 用户可读消息
    pub message: String,
}

impl ProgressEvent {
    pub fn new(stage: ProgressStage, percent: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent,
            message: message.into(),
        }
    }
}

/// 进度回调 - 核心对传输层无感知，由宿主决定事件去向
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// 丢弃所有事件的进度回调
pub fn null_sink() -> ProgressSink {
    Arc::new(|_| {})
}

/// 控制台进度回调
pub fn console_sink() -> ProgressSink {
    Arc::new(|event| {
        println!(
            "   [{:>5.1}%] {} {}",
            event.percent,
            stage_icon(event.stage),
            event.message
        );
    })
}

fn stage_icon(stage: ProgressStage) -> &'static str {
    match stage {
        ProgressStage::Clarifying => "🤔",
        ProgressStage::Planning => "📝",
        ProgressStage::Supervising => "🎯",
        ProgressStage::Delegating => "🚀",
        ProgressStage::Researching => "🔍",
        ProgressStage::GeneratingReport => "✍️",
        ProgressStage::Completed => "✅",
    }
}

/// 监督者第round轮规划对应的整体进度。
/// 监督阶段占据15%-70%区间，每轮推进10个百分点。
pub fn supervisor_round_percent(round: usize) -> f32 {
    let round = round.max(1);
    (15.0 + (round as f32 - 1.0) * 10.0).min(70.0)
}
