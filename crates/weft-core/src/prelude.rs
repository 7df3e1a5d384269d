//! # weft-core Prelude
//!
//! ## 设计意图（Why）
//! - 为上层 crate 提供稳定、浅路径的导入入口，避免业务代码中出现大量
//!   `weft_core::pipeline::...` 深层路径；
//! - 仅收录跨模块高频依赖的类型，防止 Prelude 无限膨胀。
//!
//! ## 使用方式（What）
//! - `use weft_core::prelude::*;` 即可获得配置、派发与错误处理所需的
//!   常用类型集合；新增导出遵循 SemVer 向后兼容。

pub use crate::args::{ArgBundle, ErasedArgs};
pub use crate::configuration::FactoryConfiguration;
pub use crate::error::{ErrorCause, PipelineError, PipelineErrorKind, codes};
pub use crate::factory::ProxyFactory;
pub use crate::future::BoxFuture;
pub use crate::pipeline::{
    AsyncNext, AsyncOperationBehavior, ContractBehavior, ErrorEvent, Next, OperationBehavior,
    OperationScope, PipelineEvent, PipelineEventKind, PipelineObserver, ProxyDispatcher, Stage,
};
