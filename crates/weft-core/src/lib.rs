#![cfg_attr(not(feature = "std"), no_std)]
//! # weft-core
//!
//! 类型安全的契约拦截框架核心：为任意服务契约（trait 对象）提供
//! “五阶段调用管道”（认证 → 授权 → 前置 → 内部调用 → 后置）与
//! 可组合的拦截器洋葱模型。
//!
//! ## 设计背景（Why）
//! - 业务系统常在服务边界重复手写鉴权、审计与日志逻辑，契约与横切关注点
//!   耦合后难以演进；
//! - 本 crate 把横切关注点收敛到按“契约 + 操作签名”索引的钩子注册表中，
//!   调用方只与强类型的代理交互，框架保证阶段次序与失败语义。
//!
//! ## 核心契约（What）
//! - [`pipeline::ContractBehavior`]：单个契约的配置对象，承载契约级钩子、
//!   错误钩子、操作注册表与代理策略；
//! - [`pipeline::OperationBehavior`] / [`pipeline::AsyncOperationBehavior`]：
//!   按操作签名划分的强类型钩子集合与拦截器链；
//! - [`pipeline::ProxyDispatcher`]：代理实现内部持有的调度器，负责按序
//!   执行五个阶段并实施“认证/授权缺失即拒绝”的封闭策略；
//! - [`configuration::FactoryConfiguration`] 与 [`factory::ProxyFactory`]：
//!   以契约类型为键的工厂配置与纯委托门面。
//!
//! ## 失败语义（Trade-offs）
//! - 只有内部调用（含拦截器链）产生的错误会被翻译为 `Fault` 包装错误，
//!   其余阶段的错误原样向上传播；
//! - 认证/授权阶段在钩子总数为零时直接拒绝调用，宁可误拒不可漏放。
//!
//! ## 运行环境
//! - `no_std + alloc` 可用；`std` 为默认特性，仅影响上游生态的便利集成。

extern crate alloc;

pub mod args;
pub mod configuration;
pub mod error;
pub mod factory;
pub mod future;
pub mod pipeline;
pub mod prelude;

mod sealed;

pub use crate::args::{ArgBundle, ErasedArgs};
pub use crate::configuration::FactoryConfiguration;
pub use crate::error::{ErrorCause, PipelineError, PipelineErrorKind, codes};
pub use crate::factory::ProxyFactory;
pub use crate::future::{BoxFuture, LocalBoxFuture};
pub use crate::pipeline::{
    AsyncOperationBehavior, ContractBehavior, ErrorEvent, OperationBehavior, OperationFlavor,
    OperationScope, OperationSignature, PipelineEvent, PipelineEventKind, PipelineObserver,
    ProxyDispatcher, Stage,
};
