//! 代理内部的五阶段调度器。
//!
//! # 设计背景（Why）
//! - 代理实现只应关心“把哪个操作、哪些参数交给哪个内部调用”，阶段次序、
//!   封闭策略与错误翻译规则全部收敛在调度器中，避免每个代理各写一份；
//! - 同步与异步派发共享旁路阶段逻辑：管道中只有内部调用会被 `await`。
//!
//! # 逻辑解析（How）
//! 1. 以 `(操作名, 参数类型, 返回类型)` 精确查找操作行为；未命中则回退到
//!    仅契约级钩子路径，并发出 [`PipelineEventKind::ContractScopeFallback`]
//!    诊断事件；
//! 2. 依次执行认证 → 授权 → 前置三个旁路阶段，每个阶段内契约级钩子先于
//!    操作级钩子；认证与授权阶段在两级钩子总数为零时直接拒绝（封闭策略，
//!    回退路径同样适用）；
//! 3. 内部调用经拦截器链执行；失败时先通知错误钩子，再包装为 `Fault` 上抛，
//!    后置阶段不再执行；
//! 4. 成功后执行后置阶段，契约级钩子收到返回值的擦除视图（无返回值操作
//!    收到 `None`）。
//!
//! # 风险提示（Trade-offs）
//! - 错误钩子自身失败会取代原始错误上抛（调用方将看不到 Fault 包装）。
//!
//! [`PipelineEventKind::ContractScopeFallback`]: super::observer::PipelineEventKind::ContractScopeFallback

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use crate::args::ArgBundle;
use crate::error::PipelineError;
use crate::future::BoxFuture;

use super::contract::ContractBehavior;
use super::observer::PipelineEvent;
use super::operation::{HookFn, PostHookFn};
use super::stage::Stage;

/// 强类型代理持有的调度器。
///
/// # 契约说明（What）
/// - 持有服务实例、环境上下文与契约行为三元组；
/// - [`Self::invoke`] / [`Self::invoke_async`] 是代理方法体的唯一入口，
///   操作名应与注册时使用的名称一致。
pub struct ProxyDispatcher<Cx, C: ?Sized> {
    service: Arc<C>,
    context: Cx,
    behavior: Arc<ContractBehavior<Cx, C>>,
}

impl<Cx, C> ProxyDispatcher<Cx, C>
where
    Cx: Send + Sync + 'static,
    C: ?Sized + Send + Sync + 'static,
{
    /// 装配调度器。
    pub fn new(service: Arc<C>, context: Cx, behavior: Arc<ContractBehavior<Cx, C>>) -> Self {
        Self {
            service,
            context,
            behavior,
        }
    }

    /// 被代理的服务实例。
    pub fn service(&self) -> &C {
        &self.service
    }

    /// 环境上下文。
    pub fn context(&self) -> &Cx {
        &self.context
    }

    /// 所属契约的行为配置。
    pub fn contract(&self) -> &Arc<ContractBehavior<Cx, C>> {
        &self.behavior
    }

    /// 同步派发一次操作调用。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`operation` 与注册时的操作名一致，`Args`/`R` 与注册
    ///   时的类型一致，否则回退到仅契约级钩子路径；
    /// - **后置条件**：五阶段严格按序执行；内部调用失败以 `Fault` 包装上抛
    ///   且后置阶段被跳过；其余阶段的错误原样上抛。
    pub fn invoke<Args, R>(
        &self,
        operation: &'static str,
        args: Args,
        inner: impl for<'a> FnOnce(&'a C, &'a Args) -> Result<R, PipelineError> + Send,
    ) -> Result<R, PipelineError>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let op = self.behavior.find_operation::<Args, R>(operation);
        if op.is_none() {
            self.behavior
                .emit(&PipelineEvent::contract_scope_fallback(operation));
        }

        self.bypass_stage(
            operation,
            Stage::Authenticate,
            op.as_ref().map(|o| o.authenticate_hooks()).unwrap_or_default(),
            &args,
        )?;
        self.bypass_stage(
            operation,
            Stage::Authorize,
            op.as_ref().map(|o| o.authorize_hooks()).unwrap_or_default(),
            &args,
        )?;
        self.bypass_stage(
            operation,
            Stage::PreInvoke,
            op.as_ref().map(|o| o.pre_invoke_hooks()).unwrap_or_default(),
            &args,
        )?;

        self.behavior
            .emit(&PipelineEvent::stage_started(operation, Stage::InnerInvoke));
        let inner_result = match op.as_ref() {
            Some(op) => {
                let chain = op.interceptor_chain();
                let service = &*self.service;
                let args_ref = &args;
                chain(
                    &self.context,
                    Box::new(move || inner(service, args_ref)),
                    args_ref,
                )
            }
            None => inner(&*self.service, &args),
        };
        let value = match inner_result {
            Ok(value) => value,
            Err(error) => {
                return Err(self.translate_fault(Stage::InnerInvoke.as_str(), operation, error, &args));
            }
        };

        self.post_stage(
            operation,
            op.as_ref().map(|o| o.post_invoke_hooks()).unwrap_or_default(),
            &args,
            &value,
        )?;
        Ok(value)
    }

    /// 异步派发一次操作调用，阶段次序与失败语义同 [`Self::invoke`]。
    ///
    /// # 契约说明（What）
    /// - 仅内部调用（含异步拦截器链）会被 `await`，旁路阶段同步执行；
    /// - 错误钩子的 `source` 为 `"InnerInvokeAsync"`。
    pub async fn invoke_async<Args, R>(
        &self,
        operation: &'static str,
        args: Args,
        inner: impl for<'a> FnOnce(&'a C, &'a Args) -> BoxFuture<'a, Result<R, PipelineError>> + Send,
    ) -> Result<R, PipelineError>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let op = self.behavior.find_async_operation::<Args, R>(operation);
        if op.is_none() {
            self.behavior
                .emit(&PipelineEvent::contract_scope_fallback(operation));
        }

        self.bypass_stage(
            operation,
            Stage::Authenticate,
            op.as_ref().map(|o| o.authenticate_hooks()).unwrap_or_default(),
            &args,
        )?;
        self.bypass_stage(
            operation,
            Stage::Authorize,
            op.as_ref().map(|o| o.authorize_hooks()).unwrap_or_default(),
            &args,
        )?;
        self.bypass_stage(
            operation,
            Stage::PreInvoke,
            op.as_ref().map(|o| o.pre_invoke_hooks()).unwrap_or_default(),
            &args,
        )?;

        self.behavior
            .emit(&PipelineEvent::stage_started(operation, Stage::InnerInvoke));
        let inner_result = match op.as_ref() {
            Some(op) => {
                let chain = op.interceptor_chain();
                let service = &*self.service;
                let args_ref = &args;
                chain(
                    &self.context,
                    Box::new(move || inner(service, args_ref)),
                    args_ref,
                )
                .await
            }
            None => inner(&*self.service, &args).await,
        };
        let value = match inner_result {
            Ok(value) => value,
            Err(error) => {
                return Err(self.translate_fault("InnerInvokeAsync", operation, error, &args));
            }
        };

        self.post_stage(
            operation,
            op.as_ref().map(|o| o.post_invoke_hooks()).unwrap_or_default(),
            &args,
            &value,
        )?;
        Ok(value)
    }

    fn bypass_stage<Args>(
        &self,
        operation: &'static str,
        stage: Stage,
        local: Vec<HookFn<Cx, Args>>,
        args: &Args,
    ) -> Result<(), PipelineError>
    where
        Args: ArgBundle,
    {
        self.behavior
            .emit(&PipelineEvent::stage_started(operation, stage));
        let contract = match stage {
            Stage::Authenticate => self.behavior.authenticate_hooks(),
            Stage::Authorize => self.behavior.authorize_hooks(),
            Stage::PreInvoke => self.behavior.pre_invoke_hooks(),
            Stage::InnerInvoke | Stage::PostInvoke => Vec::new(),
        };

        // 封闭策略：认证/授权两级钩子总数为零即拒绝，回退路径同样适用。
        match stage {
            Stage::Authenticate if contract.is_empty() && local.is_empty() => {
                return Err(PipelineError::authentication_missing(operation));
            }
            Stage::Authorize if contract.is_empty() && local.is_empty() => {
                return Err(PipelineError::authorization_missing(operation));
            }
            _ => {}
        }

        for hook in &contract {
            hook(&self.context, args)?;
        }
        for hook in &local {
            hook(&self.context, args)?;
        }
        Ok(())
    }

    fn post_stage<Args, R>(
        &self,
        operation: &'static str,
        local: Vec<PostHookFn<Cx, Args, R>>,
        args: &Args,
        value: &R,
    ) -> Result<(), PipelineError>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        self.behavior
            .emit(&PipelineEvent::stage_started(operation, Stage::PostInvoke));
        let erased: Option<&dyn Any> = if TypeId::of::<R>() == TypeId::of::<()>() {
            None
        } else {
            Some(value as &dyn Any)
        };
        for hook in &self.behavior.post_invoke_hooks() {
            hook(&self.context, args, erased)?;
        }
        for hook in &local {
            hook(&self.context, args, value)?;
        }
        Ok(())
    }

    fn translate_fault<Args>(
        &self,
        source: &'static str,
        operation: &'static str,
        error: PipelineError,
        args: &Args,
    ) -> PipelineError
    where
        Args: ArgBundle,
    {
        self.behavior.emit(&PipelineEvent::inner_faulted(
            operation,
            String::from(error.message()),
        ));
        if let Err(masked) = self.behavior.raise_error(source, &self.context, &error, args) {
            // 错误钩子自身失败：新错误取代原始错误上抛。
            return masked;
        }
        PipelineError::fault(error)
    }
}
