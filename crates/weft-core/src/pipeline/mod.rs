//! 五阶段拦截管道的契约与调度实现。
//!
//! # 模块分工（How）
//! - [`signature`]：操作签名（名称 + 参数类型 + 返回类型 + 同步/异步口味）；
//! - [`stage`]：阶段枚举与操作级钩子存储；
//! - [`operation`]：强类型的操作级行为（钩子 + 拦截器洋葱）；
//! - [`contract`]：契约级行为（擦除钩子、错误钩子、操作注册表、代理策略）;
//! - [`observer`]：调度诊断事件与观察者接口；
//! - [`dispatch`]：代理内部的五阶段调度器。

pub mod contract;
pub mod dispatch;
pub mod observer;
pub mod operation;
pub mod signature;
pub mod stage;

pub use contract::{ContractBehavior, ErasedHookFn, ErasedPostHookFn, ErrorEvent, ErrorHookFn, OperationScope, ProxyCtor};
pub use dispatch::ProxyDispatcher;
pub use observer::{PipelineEvent, PipelineEventKind, PipelineObserver};
pub use operation::{
    AsyncChainFn, AsyncInterceptorFn, AsyncNext, AsyncOperationBehavior, ChainFn, HookFn,
    InterceptorFn, Next, OperationBehavior, PostHookFn,
};
pub use signature::{OperationFlavor, OperationSignature};
pub use stage::Stage;
