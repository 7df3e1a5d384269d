//! 契约级行为：擦除钩子、错误钩子、操作注册表与代理策略。
//!
//! # 设计背景（Why）
//! - 契约级钩子作用于契约下的**所有**操作，注册时无法得知具体参数类型，
//!   因此以 [`ErasedArgs`] 的类型擦除视图接收参数；
//! - 操作注册表以 [`OperationSignature`] 为键，让同名重载与同步/异步
//!   版本互不覆盖；
//! - 代理策略（构造代理 / 显式直通 / 未设置）收敛为一个枚举，设置任一
//!   策略即覆盖另一个，天然满足互斥要求。
//!
//! # 风险提示（Trade-offs）
//! - 错误钩子本身可失败：一旦失败，新错误会**取代**正在上抛的原始错误。
//!   错误钩子应当只做观察与记录，谨慎返回错误。

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::ops::Deref;

use spin::RwLock;

use crate::args::{ArgBundle, ErasedArgs};
use crate::error::PipelineError;

use super::observer::{PipelineEvent, PipelineObserver};
use super::operation::{AsyncOperationBehavior, OperationBehavior};
use super::signature::{OperationFlavor, OperationSignature};

/// 契约级旁路钩子：以擦除视图观察参数，可否决调用。
pub type ErasedHookFn<Cx> =
    Arc<dyn Fn(&Cx, &dyn ErasedArgs) -> Result<(), PipelineError> + Send + Sync>;

/// 契约级后置钩子：额外观察擦除后的返回值，无返回值操作收到 `None`。
pub type ErasedPostHookFn<Cx> = Arc<
    dyn Fn(&Cx, &dyn ErasedArgs, Option<&dyn Any>) -> Result<(), PipelineError> + Send + Sync,
>;

/// 错误钩子：观察内部调用失败事件，自身也可能失败（见模块级风险提示）。
pub type ErrorHookFn<Cx> =
    Arc<dyn Fn(&ErrorEvent<'_, Cx>) -> Result<(), PipelineError> + Send + Sync>;

/// 代理构造器：以服务实例、环境上下文与契约行为装配代理。
pub type ProxyCtor<Cx, C> =
    Box<dyn Fn(Arc<C>, Cx, Arc<ContractBehavior<Cx, C>>) -> Arc<C> + Send + Sync>;

/// 内部调用失败时交给错误钩子的事件视图。
///
/// # 契约说明（What）
/// - 借用视图仅在钩子回调期间有效；
/// - `source` 为失败来源的稳定标识（如 `"InnerInvoke"` / `"InnerInvokeAsync"`）。
pub struct ErrorEvent<'a, Cx> {
    source: &'static str,
    context: &'a Cx,
    error: &'a PipelineError,
    input: &'a dyn ErasedArgs,
}

impl<'a, Cx> ErrorEvent<'a, Cx> {
    pub(crate) fn new(
        source: &'static str,
        context: &'a Cx,
        error: &'a PipelineError,
        input: &'a dyn ErasedArgs,
    ) -> Self {
        Self {
            source,
            context,
            error,
            input,
        }
    }

    /// 失败来源标识。
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// 调用时的环境上下文。
    pub fn context(&self) -> &'a Cx {
        self.context
    }

    /// 原始错误（尚未包装为 Fault）。
    pub fn error(&self) -> &'a PipelineError {
        self.error
    }

    /// 调用参数的擦除视图。
    pub fn input(&self) -> &'a dyn ErasedArgs {
        self.input
    }
}

enum ProxyStrategy<Cx, C: ?Sized> {
    Unset,
    NoProxy,
    Factory(ProxyCtor<Cx, C>),
}

/// 单个契约的配置对象。
///
/// # 契约说明（What）
/// - 所有注册方法通过内部可变性接受 `&self` 并返回 `&Self`；
/// - 操作注册表的取用遵循 get-or-create：同一签名反复注册得到同一份行为；
/// - [`Self::create`] 的结果由代理策略决定：直通返回原服务句柄，工厂策略
///   调用构造器，未设置策略则返回配置错误。
pub struct ContractBehavior<Cx, C: ?Sized> {
    authenticate: RwLock<Vec<ErasedHookFn<Cx>>>,
    authorize: RwLock<Vec<ErasedHookFn<Cx>>>,
    pre_invoke: RwLock<Vec<ErasedHookFn<Cx>>>,
    post_invoke: RwLock<Vec<ErasedPostHookFn<Cx>>>,
    error_hooks: RwLock<Vec<ErrorHookFn<Cx>>>,
    observers: RwLock<Vec<Arc<dyn PipelineObserver>>>,
    operations: RwLock<BTreeMap<OperationSignature, Arc<dyn Any + Send + Sync>>>,
    strategy: RwLock<ProxyStrategy<Cx, C>>,
}

impl<Cx, C> ContractBehavior<Cx, C>
where
    Cx: Send + Sync + 'static,
    C: ?Sized + Send + Sync + 'static,
{
    /// 创建空配置：无钩子、无操作、代理策略未设置。
    pub fn new() -> Self {
        Self {
            authenticate: RwLock::new(Vec::new()),
            authorize: RwLock::new(Vec::new()),
            pre_invoke: RwLock::new(Vec::new()),
            post_invoke: RwLock::new(Vec::new()),
            error_hooks: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            operations: RwLock::new(BTreeMap::new()),
            strategy: RwLock::new(ProxyStrategy::Unset),
        }
    }

    /// 追加契约级认证钩子。
    pub fn authenticate(
        &self,
        hook: impl Fn(&Cx, &dyn ErasedArgs) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.authenticate.write().push(Arc::new(hook));
        self
    }

    /// 追加契约级授权钩子。
    pub fn authorize(
        &self,
        hook: impl Fn(&Cx, &dyn ErasedArgs) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.authorize.write().push(Arc::new(hook));
        self
    }

    /// 追加契约级前置钩子。
    pub fn pre_invoke(
        &self,
        hook: impl Fn(&Cx, &dyn ErasedArgs) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.pre_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加契约级后置钩子。
    ///
    /// # 契约说明（What）
    /// - 第三个参数为返回值的擦除视图；无返回值操作收到 `None`。
    pub fn post_invoke(
        &self,
        hook: impl Fn(&Cx, &dyn ErasedArgs, Option<&dyn Any>) -> Result<(), PipelineError>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.post_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加错误钩子，按注册顺序执行。
    pub fn on_error(
        &self,
        hook: impl Fn(&ErrorEvent<'_, Cx>) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.error_hooks.write().push(Arc::new(hook));
        self
    }

    /// 安装调度诊断观察者。
    pub fn observe(&self, observer: impl PipelineObserver + 'static) -> &Self {
        self.observers.write().push(Arc::new(observer));
        self
    }

    /// 取用（必要时创建）同步操作的行为集合。
    ///
    /// # 契约说明（What）
    /// - **幂等性**：同一 `(名称, 参数类型, 返回类型)` 反复调用返回同一份行为；
    /// - 返回的作用域可经 [`OperationScope::contract`] 回到契约层继续配置。
    pub fn operation<Args, R>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> OperationScope<'_, Cx, C, OperationBehavior<Cx, Args, R>>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let key = OperationSignature::of::<Args, R>(name, OperationFlavor::Sync);
        OperationScope {
            contract: self,
            behavior: self.ensure_operation(key),
        }
    }

    /// 取用（必要时创建）异步操作的行为集合，幂等性同 [`Self::operation`]。
    pub fn async_operation<Args, R>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> OperationScope<'_, Cx, C, AsyncOperationBehavior<Cx, Args, R>>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let key = OperationSignature::of::<Args, R>(name, OperationFlavor::Async);
        OperationScope {
            contract: self,
            behavior: self.ensure_operation(key),
        }
    }

    fn ensure_operation<B: Any + Send + Sync + Default>(&self, key: OperationSignature) -> Arc<B> {
        if let Some(entry) = self.operations.read().get(&key) {
            if let Ok(behavior) = Arc::downcast::<B>(entry.clone()) {
                return behavior;
            }
        }

        let mut guard = self.operations.write();
        // 双重检查：竞争方可能已在获取写锁前完成插入。
        if let Some(entry) = guard.get(&key) {
            if let Ok(behavior) = Arc::downcast::<B>(entry.clone()) {
                return behavior;
            }
        }
        let behavior = Arc::new(B::default());
        guard.insert(key, behavior.clone() as Arc<dyn Any + Send + Sync>);
        behavior
    }

    pub(crate) fn find_operation<Args, R>(
        &self,
        name: &'static str,
    ) -> Option<Arc<OperationBehavior<Cx, Args, R>>>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let key = OperationSignature::of::<Args, R>(name, OperationFlavor::Sync);
        self.operations
            .read()
            .get(&key)
            .and_then(|entry| Arc::downcast(entry.clone()).ok())
    }

    pub(crate) fn find_async_operation<Args, R>(
        &self,
        name: &'static str,
    ) -> Option<Arc<AsyncOperationBehavior<Cx, Args, R>>>
    where
        Args: ArgBundle,
        R: Send + 'static,
    {
        let key = OperationSignature::of::<Args, R>(name, OperationFlavor::Async);
        self.operations
            .read()
            .get(&key)
            .and_then(|entry| Arc::downcast(entry.clone()).ok())
    }

    /// 设置工厂策略：以给定构造器装配代理。
    ///
    /// # 契约说明（What）
    /// - 与 [`Self::no_proxy`] 互斥：后设置者覆盖先设置者。
    pub fn with_proxy(
        &self,
        ctor: impl Fn(Arc<C>, Cx, Arc<ContractBehavior<Cx, C>>) -> Arc<C> + Send + Sync + 'static,
    ) -> &Self {
        *self.strategy.write() = ProxyStrategy::Factory(Box::new(ctor));
        self
    }

    /// 设置显式直通策略：创建时原样返回服务句柄。
    ///
    /// # 契约说明（What）
    /// - 与 [`Self::with_proxy`] 互斥：后设置者覆盖先设置者。
    pub fn no_proxy(&self) -> &Self {
        *self.strategy.write() = ProxyStrategy::NoProxy;
        self
    }

    /// 按当前代理策略装配实例。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：已通过 [`Self::with_proxy`] 或 [`Self::no_proxy`]
    ///   显式选择策略，否则返回配置错误；
    /// - **后置条件**：直通策略下返回与入参相同的服务句柄（指针相等）。
    pub fn create(self: &Arc<Self>, service: Arc<C>, context: Cx) -> Result<Arc<C>, PipelineError> {
        match &*self.strategy.read() {
            ProxyStrategy::NoProxy => Ok(service),
            ProxyStrategy::Factory(ctor) => Ok(ctor(service, context, Arc::clone(self))),
            ProxyStrategy::Unset => Err(PipelineError::configuration(
                "契约未选择代理策略：需要直通语义时必须显式调用 no_proxy()",
            )),
        }
    }

    /// 按注册顺序执行错误钩子。
    ///
    /// # 风险提示（Trade-offs）
    /// - 任一钩子失败会中断后续钩子并上抛新错误，原始错误因此被掩盖。
    pub fn raise_error(
        &self,
        source: &'static str,
        context: &Cx,
        error: &PipelineError,
        input: &dyn ErasedArgs,
    ) -> Result<(), PipelineError> {
        let hooks = self.error_hooks.read().clone();
        let event = ErrorEvent::new(source, context, error, input);
        for hook in hooks {
            hook(&event)?;
        }
        Ok(())
    }

    pub(crate) fn emit(&self, event: &PipelineEvent<'_>) {
        for observer in self.observers.read().iter() {
            observer.on_event(event);
        }
    }

    pub(crate) fn authenticate_hooks(&self) -> Vec<ErasedHookFn<Cx>> {
        self.authenticate.read().clone()
    }

    pub(crate) fn authorize_hooks(&self) -> Vec<ErasedHookFn<Cx>> {
        self.authorize.read().clone()
    }

    pub(crate) fn pre_invoke_hooks(&self) -> Vec<ErasedHookFn<Cx>> {
        self.pre_invoke.read().clone()
    }

    pub(crate) fn post_invoke_hooks(&self) -> Vec<ErasedPostHookFn<Cx>> {
        self.post_invoke.read().clone()
    }
}

impl<Cx, C> Default for ContractBehavior<Cx, C>
where
    Cx: Send + Sync + 'static,
    C: ?Sized + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 操作注册作用域：解引用到操作行为，同时保留回到契约层的通路。
pub struct OperationScope<'c, Cx, C: ?Sized, B> {
    contract: &'c ContractBehavior<Cx, C>,
    behavior: Arc<B>,
}

impl<'c, Cx, C: ?Sized, B> OperationScope<'c, Cx, C, B> {
    /// 回到所属契约，便于跨作用域链式配置。
    pub fn contract(&self) -> &'c ContractBehavior<Cx, C> {
        self.contract
    }

    /// 取出操作行为的共享句柄。
    pub fn behavior(&self) -> Arc<B> {
        Arc::clone(&self.behavior)
    }
}

impl<'c, Cx, C: ?Sized, B> Deref for OperationScope<'c, Cx, C, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.behavior
    }
}
