//! 调度诊断事件与观察者接口。
//!
//! # 设计背景（Why）
//! - 操作签名未命中时管道会静默回退到“仅契约级钩子”路径，这在配置错误
//!   （如注册时参数类型写错）时极难排查；
//! - 核心 crate 不绑定任何日志后端，改为定义值类型事件与观察者接口，
//!   由上层 crate（如 `weft-observe`）桥接到具体遥测栈。

use alloc::borrow::Cow;

use super::stage::Stage;

/// 诊断事件的分类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineEventKind {
    /// 某阶段开始执行。
    StageStarted,
    /// 操作签名未命中，回退到仅契约级钩子路径。
    ContractScopeFallback,
    /// 内部调用（含拦截器链）失败，即将包装为 Fault。
    InnerFaulted,
}

/// 一次调度产生的诊断事件。
///
/// # 契约说明（What）
/// - 事件是借用视图，仅在回调期间有效，观察者如需留存必须自行复制。
#[derive(Clone, Debug)]
pub struct PipelineEvent<'a> {
    kind: PipelineEventKind,
    operation: &'a str,
    stage: Stage,
    note: Option<Cow<'static, str>>,
}

impl<'a> PipelineEvent<'a> {
    /// 阶段开始事件。
    pub fn stage_started(operation: &'a str, stage: Stage) -> Self {
        Self {
            kind: PipelineEventKind::StageStarted,
            operation,
            stage,
            note: None,
        }
    }

    /// 签名未命中回退事件。
    pub fn contract_scope_fallback(operation: &'a str) -> Self {
        Self {
            kind: PipelineEventKind::ContractScopeFallback,
            operation,
            stage: Stage::Authenticate,
            note: Some(Cow::Borrowed("操作签名未命中，回退到仅契约级钩子")),
        }
    }

    /// 内部调用失败事件。
    pub fn inner_faulted(operation: &'a str, note: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: PipelineEventKind::InnerFaulted,
            operation,
            stage: Stage::InnerInvoke,
            note: Some(note.into()),
        }
    }

    /// 事件分类。
    pub fn kind(&self) -> PipelineEventKind {
        self.kind
    }

    /// 关联的操作名。
    pub fn operation(&self) -> &str {
        self.operation
    }

    /// 关联的阶段。
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// 补充说明。
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// 调度诊断观察者。
///
/// # 契约说明（What）
/// - 回调在调用线程上同步执行，实现必须轻量且不得 panic；
/// - 观察者失败不应影响业务结果，接口因此不返回 `Result`。
pub trait PipelineObserver: Send + Sync {
    /// 接收一条诊断事件。
    fn on_event(&self, event: &PipelineEvent<'_>);
}
