//! # weft-observe
//!
//! 将 [`weft_core`] 的调度诊断事件桥接到 `tracing` 生态。
//!
//! ## 设计背景（Why）
//! - `weft-core` 刻意不绑定日志后端，只定义 [`PipelineObserver`] 接口；
//! - 生产环境绝大多数 Rust 服务以 `tracing` 作为遥测入口，本 crate 提供
//!   开箱即用的桥接实现，让“签名未命中回退”“内部调用失败”等关键信号
//!   进入既有的日志管道。
//!
//! ## 使用方式（What）
//! ```ignore
//! let contract = factory.for_contract::<dyn Calculator>();
//! contract.observe(TracingObserver::new());
//! ```

use tracing::{trace, warn};
use weft_core::pipeline::{PipelineEvent, PipelineEventKind, PipelineObserver};

/// 把调度诊断事件转写为 `tracing` 事件的观察者。
///
/// # 契约说明（What）
/// - 阶段开始以 `TRACE` 级别输出（高频、默认不可见）；
/// - 签名未命中回退与内部调用失败以 `WARN` 级别输出，两者都是需要人工
///   关注的信号。
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// 创建观察者。
    pub fn new() -> Self {
        Self
    }
}

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match event.kind() {
            PipelineEventKind::StageStarted => {
                trace!(
                    target: "weft",
                    operation = event.operation(),
                    stage = %event.stage(),
                    "管道阶段开始"
                );
            }
            PipelineEventKind::ContractScopeFallback => {
                warn!(
                    target: "weft",
                    operation = event.operation(),
                    note = event.note().unwrap_or_default(),
                    "操作签名未命中，回退到仅契约级钩子路径"
                );
            }
            PipelineEventKind::InnerFaulted => {
                warn!(
                    target: "weft",
                    operation = event.operation(),
                    note = event.note().unwrap_or_default(),
                    "内部调用失败，即将包装为 Fault"
                );
            }
        }
    }
}
