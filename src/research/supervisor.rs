//! 监督者循环 - 以显式状态机实现的研究编排
//!
//! 每轮规划向模型暴露三种决策能力：委托研究、宣告完成、策略反思。
//! 委托受并发上限约束，被接受的研究单元在fan-out/fan-in屏障内并行执行，
//! 全部返回后监督者才进入下一轮。监督者自身不持有任何副作用工具。

use std::sync::Arc;

use futures::future::join_all;

use crate::config::ResearchOptions;
use crate::llm::client::{ChatMessage, ModelGateway, ModelTurn, ToolCallRequest};
use crate::llm::tools::{ResearchTool, ToolDescriptor};
use crate::progress::{self, ProgressEvent, ProgressSink, ProgressStage};
use crate::research::prompts;
use crate::research::researcher::ResearcherUnit;
use crate::research::state::{ResearchBrief, ResearcherTask, SupervisorPhase, SupervisorState};

pub const TOOL_CONDUCT_RESEARCH: &str = "conduct_research";
pub const TOOL_RESEARCH_COMPLETE: &str = "research_complete";
pub const TOOL_THINK: &str = "think";

/// 监督者的决策能力描述。
/// 这些只是决策信号的schema，由监督者循环自行解释执行，不绑定执行器。
fn decision_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: TOOL_CONDUCT_RESEARCH.to_string(),
            description: "委托一个研究子任务。主题应单一且足够详细（至少一段话），子任务之间互相不可见。".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "research_topic": {
                        "type": "string",
                        "description": "要研究的主题，包含全部必要上下文"
                    }
                },
                "required": ["research_topic"]
            }),
        },
        ToolDescriptor {
            name: TOOL_RESEARCH_COMPLETE.to_string(),
            description: "宣告研究已收集到足够信息，可以进入报告综合阶段。".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        },
        ToolDescriptor {
            name: TOOL_THINK.to_string(),
            description: "记录对研究进展的策略性反思，不产生任何执行副作用。".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "reflection": {"type": "string", "description": "反思内容"}
                },
                "required": ["reflection"]
            }),
        },
    ]
}

/// 单轮计划 - 由纯函数计算，与状态合并分离
#[derive(Debug, Default)]
pub struct TurnPlan {
    /// 本轮结束后的下一阶段
    pub next_phase: SupervisorPhase,
    /// 被接受执行的研究子任务
    pub accepted: Vec<ResearcherTask>,
    /// 超出并发上限而被拒绝的委托调用
    pub rejected: Vec<ToolCallRequest>,
    /// 反思调用，仅需回执确认
    pub reflections: Vec<ToolCallRequest>,
}

/// 依据模型输出与预算计算本轮行动与下一阶段（纯函数，无副作用）。
///
/// 硬退出条件按顺序评估：
/// 1. 迭代预算耗尽 - 强制完成，即便同轮出现完成信号或新委托
/// 2. 模型宣告研究完成
/// 3. 其余情况按委托/反思继续
pub fn plan_turn(
    state: &SupervisorState,
    options: &ResearchOptions,
    turn: &ModelTurn,
) -> TurnPlan {
    if state.iterations >= options.max_researcher_iterations {
        return TurnPlan {
            next_phase: SupervisorPhase::Complete,
            ..Default::default()
        };
    }

    if turn
        .tool_calls
        .iter()
        .any(|call| call.name == TOOL_RESEARCH_COMPLETE)
    {
        return TurnPlan {
            next_phase: SupervisorPhase::Complete,
            ..Default::default()
        };
    }

    let reflections: Vec<ToolCallRequest> = turn
        .tool_calls
        .iter()
        .filter(|call| call.name == TOOL_THINK)
        .cloned()
        .collect();

    let delegations: Vec<&ToolCallRequest> = turn
        .tool_calls
        .iter()
        .filter(|call| call.name == TOOL_CONDUCT_RESEARCH)
        .collect();

    let limit = options.max_concurrent_research_units;
    let accepted: Vec<ResearcherTask> = delegations
        .iter()
        .take(limit)
        .map(|call| ResearcherTask {
            call_id: call.id.clone(),
            topic: extract_topic(call),
        })
        .collect();
    let rejected: Vec<ToolCallRequest> = delegations
        .iter()
        .skip(limit)
        .map(|call| (*call).clone())
        .collect();

    let next_phase = if accepted.is_empty() {
        // 零有效委托（含纯反思轮）：计入一次迭代后重新规划
        SupervisorPhase::Planning
    } else {
        SupervisorPhase::Delegating
    };

    TurnPlan {
        next_phase,
        accepted,
        rejected,
        reflections,
    }
}

fn extract_topic(call: &ToolCallRequest) -> String {
    call.arguments
        .get("research_topic")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| call.arguments.to_string())
}

/// 监督者循环
pub struct SupervisorLoop {
    gateway: Arc<dyn ModelGateway>,
    researcher_tools: Vec<Arc<dyn ResearchTool>>,
    options: ResearchOptions,
    progress: ProgressSink,
}

impl SupervisorLoop {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        researcher_tools: Vec<Arc<dyn ResearchTool>>,
        options: ResearchOptions,
        progress: ProgressSink,
    ) -> Self {
        Self {
            gateway,
            researcher_tools,
            options,
            progress,
        }
    }

    /// 以研究简报驱动完整的监督循环，总是返回（可能部分的）最终状态。
    /// 预算耗尽与模型侧错误都在内部转化为终态，不向上抛出。
    pub async fn run(&self, brief: &ResearchBrief) -> SupervisorState {
        let mut state = SupervisorState {
            messages: vec![ChatMessage::user(brief.as_str().to_string())],
            ..Default::default()
        };
        let tools = decision_tools();

        loop {
            // 硬退出条件：迭代预算在发起新一轮规划前检查
            if state.iterations >= self.options.max_researcher_iterations {
                state.phase = SupervisorPhase::Complete;
                println!(
                    "   🛑 达到最大规划迭代次数 ({})，强制完成研究",
                    self.options.max_researcher_iterations
                );
                break;
            }

            let round = state.iterations + 1;
            (self.progress)(ProgressEvent::new(
                ProgressStage::Supervising,
                progress::supervisor_round_percent(round),
                format!("监督者第{}轮规划", round),
            ));

            let system_prompt = prompts::lead_researcher_prompt(
                round,
                self.options.max_researcher_iterations,
                self.options.max_concurrent_research_units,
            );

            let turn = match self
                .gateway
                .complete(&system_prompt, &state.messages, &tools)
                .await
            {
                Ok(turn) => turn,
                Err(e) => {
                    // 模型侧失败（含上下文超限）终止本请求的研究，
                    // 已聚合的notes原样上交
                    eprintln!("   ❌ 监督者决策失败，提前终止研究: {}", e);
                    state.phase = SupervisorPhase::Aborted;
                    break;
                }
            };

            state.messages.push(ChatMessage::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            let plan = plan_turn(&state, &self.options, &turn);

            // 反思只需回执，不产生执行副作用
            for reflection in &plan.reflections {
                let ack = reflection
                    .arguments
                    .get("reflection")
                    .and_then(|v| v.as_str())
                    .map(|r| format!("反思已记录: {}", r))
                    .unwrap_or_else(|| "反思已记录".to_string());
                state
                    .messages
                    .push(ChatMessage::tool_result(&reflection.id, TOOL_THINK, ack));
            }

            // 超出并发上限的委托逐个合成错误结果，让模型下一轮可见原因
            for rejected in &plan.rejected {
                state.messages.push(ChatMessage::tool_result(
                    &rejected.id,
                    TOOL_CONDUCT_RESEARCH,
                    format!(
                        "错误：超出最大并发研究单元数（上限{}），本次委托未执行。请减少单轮委托数量或等待下一轮。",
                        self.options.max_concurrent_research_units
                    ),
                ));
            }

            match plan.next_phase {
                SupervisorPhase::Complete => {
                    state.phase = SupervisorPhase::Complete;
                    println!("   ✅ 监督者宣告研究完成，共 {} 条发现", state.notes.len());
                    break;
                }
                SupervisorPhase::Aborted => {
                    state.phase = SupervisorPhase::Aborted;
                    break;
                }
                SupervisorPhase::Delegating => {
                    state.phase = SupervisorPhase::Delegating;
                    self.execute_batch(&mut state, &plan.accepted).await;
                    state.iterations += 1;
                    state.phase = SupervisorPhase::Planning;
                }
                SupervisorPhase::Planning => {
                    // 零有效调用同样消耗预算，防止无操作循环逃逸预算控制
                    state.iterations += 1;
                    state.phase = SupervisorPhase::Planning;
                }
            }
        }

        state
    }

    /// fan-out/fan-in：同批研究单元并行启动，全部完成后才返回。
    /// 单个单元的失败不会取消同批其它单元，失败以错误结果并入历史。
    async fn execute_batch(&self, state: &mut SupervisorState, tasks: &[ResearcherTask]) {
        println!("   📋 并行执行 {} 个研究任务", tasks.len());

        for task in tasks {
            (self.progress)(ProgressEvent::new(
                ProgressStage::Delegating,
                progress::supervisor_round_percent(state.iterations + 1),
                format!("启动研究单元: {}", truncate_topic(&task.topic)),
            ));
        }

        let unit = ResearcherUnit::new(
            self.gateway.clone(),
            self.researcher_tools.clone(),
            self.options.clone(),
        );
        let results = join_all(tasks.iter().map(|task| unit.run(task))).await;

        for (task, result) in tasks.iter().zip(results) {
            match result {
                Ok(output) => {
                    let summary = if output.compressed_research.is_empty() {
                        "研究单元因资源限制提前结束，未产出压缩摘要。".to_string()
                    } else {
                        output.compressed_research.clone()
                    };

                    state.messages.push(ChatMessage::tool_result(
                        &task.call_id,
                        TOOL_CONDUCT_RESEARCH,
                        summary.clone(),
                    ));
                    if !output.compressed_research.is_empty() {
                        state.notes.push(output.compressed_research);
                    }
                    state.raw_notes.extend(output.raw_notes);
                }
                Err(e) => {
                    state.messages.push(ChatMessage::tool_result(
                        &task.call_id,
                        TOOL_CONDUCT_RESEARCH,
                        format!("研究单元执行失败: {}", e),
                    ));
                }
            }

            (self.progress)(ProgressEvent::new(
                ProgressStage::Researching,
                progress::supervisor_round_percent(state.iterations + 1),
                format!("研究单元完成: {}", truncate_topic(&task.topic)),
            ));
        }
    }
}

fn truncate_topic(topic: &str) -> String {
    const MAX_CHARS: usize = 40;
    if topic.chars().count() <= MAX_CHARS {
        topic.to_string()
    } else {
        let truncated: String = topic.chars().take(MAX_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::ModelTurn;

    fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args,
        }
    }

    fn delegation(id: &str, topic: &str) -> ToolCallRequest {
        call(
            id,
            TOOL_CONDUCT_RESEARCH,
            serde_json::json!({"research_topic": topic}),
        )
    }

    fn options(units: usize, iterations: usize) -> ResearchOptions {
        ResearchOptions {
            max_concurrent_research_units: units,
            max_researcher_iterations: iterations,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_turn_accepts_within_limit() {
        let state = SupervisorState::default();
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![delegation("c1", "主题A"), delegation("c2", "主题B")],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);

        assert_eq!(plan.next_phase, SupervisorPhase::Delegating);
        assert_eq!(plan.accepted.len(), 2);
        assert!(plan.rejected.is_empty());
        assert_eq!(plan.accepted[0].topic, "主题A");
        assert_eq!(plan.accepted[0].call_id, "c1");
    }

    #[test]
    fn test_plan_turn_rejects_overflow_with_call_ids() {
        let state = SupervisorState::default();
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![
                delegation("c1", "主题A"),
                delegation("c2", "主题B"),
                delegation("c3", "主题C"),
            ],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);

        // 接受数 = min(请求数, 并发上限)，超额部分逐个拒绝并保留调用id
        assert_eq!(plan.accepted.len(), 2);
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].id, "c3");
    }

    #[test]
    fn test_plan_turn_completion_signal() {
        let state = SupervisorState::default();
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![call(
                "c1",
                TOOL_RESEARCH_COMPLETE,
                serde_json::json!({}),
            )],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);
        assert_eq!(plan.next_phase, SupervisorPhase::Complete);
        assert!(plan.accepted.is_empty());
    }

    #[test]
    fn test_plan_turn_cap_takes_precedence_over_everything() {
        // 迭代预算耗尽的同一轮即便模型继续委托甚至宣告完成，
        // 也按预算强制完成处理
        let state = SupervisorState {
            iterations: 3,
            ..Default::default()
        };
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![
                delegation("c1", "主题A"),
                call("c2", TOOL_RESEARCH_COMPLETE, serde_json::json!({})),
            ],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);
        assert_eq!(plan.next_phase, SupervisorPhase::Complete);
        assert!(plan.accepted.is_empty());
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_plan_turn_zero_actionable_calls_keeps_planning() {
        let state = SupervisorState::default();
        let turn = ModelTurn::text("我还在考虑下一步");

        let plan = plan_turn(&state, &options(2, 3), &turn);
        assert_eq!(plan.next_phase, SupervisorPhase::Planning);
        assert!(plan.accepted.is_empty());
    }

    #[test]
    fn test_plan_turn_reflection_only() {
        let state = SupervisorState::default();
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![call(
                "c1",
                TOOL_THINK,
                serde_json::json!({"reflection": "已有发现覆盖主要维度"}),
            )],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);

        // 纯反思轮不委托、不完成，回到规划
        assert_eq!(plan.next_phase, SupervisorPhase::Planning);
        assert_eq!(plan.reflections.len(), 1);
        assert!(plan.accepted.is_empty());
    }

    #[test]
    fn test_plan_turn_mixed_reflection_and_delegation() {
        let state = SupervisorState::default();
        let turn = ModelTurn {
            content: String::new(),
            tool_calls: vec![
                call("c1", TOOL_THINK, serde_json::json!({"reflection": "先拆分"})),
                delegation("c2", "主题A"),
            ],
        };

        let plan = plan_turn(&state, &options(2, 3), &turn);

        // 反思不占用委托额度
        assert_eq!(plan.reflections.len(), 1);
        assert_eq!(plan.accepted.len(), 1);
        assert_eq!(plan.next_phase, SupervisorPhase::Delegating);
    }

    #[test]
    fn test_extract_topic_fallback() {
        let malformed = call("c1", TOOL_CONDUCT_RESEARCH, serde_json::json!({"foo": 1}));
        assert_eq!(extract_topic(&malformed), r#"{"foo":1}"#);
    }
}
