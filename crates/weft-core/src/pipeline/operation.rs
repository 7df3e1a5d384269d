//! 操作级行为：强类型钩子集合与拦截器洋葱。
//!
//! # 设计背景（Why）
//! - 认证、授权、前置、后置四个阶段是“旁路观察 + 可否决”的钩子序列，
//!   而拦截器需要环绕内部调用本身（before / 调用 / after），两者的组合
//!   规则不同，必须分开建模；
//! - 拦截器链的组合成本与注册数量线性相关，而单个操作在首次调用后注册
//!   表即趋于稳定，因此链在首次调用时一次性组合并缓存。
//!
//! # 逻辑解析（How）
//! - 钩子按注册顺序保存在 `spin::RwLock<Vec<Arc<_>>>` 中，注册方法借助
//!   内部可变性返回 `&Self`，支持流式链式调用；
//! - 拦截器组合以“透传续延”为基底，按注册顺序的**逆序**逐层包裹，
//!   从而保证**先注册者在最外层**：I1-before → I2-before → 内部调用 →
//!   I2-after → I1-after；
//! - 组合结果经 [`spin::Once`] 缓存，并发首调也只组合一次。
//!
//! # 风险提示（Trade-offs）
//! - 链一旦组合完成即冻结：之后再注册的拦截器不会出现在已缓存的链上。
//!   注册应在首次派发之前完成。

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::{Once, RwLock};

use crate::args::ArgBundle;
use crate::error::PipelineError;
use crate::future::BoxFuture;

/// 旁路钩子：观察上下文与参数，可通过返回错误否决调用。
pub type HookFn<Cx, Args> =
    Arc<dyn Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync>;

/// 后置钩子：额外观察内部调用的返回值。
pub type PostHookFn<Cx, Args, R> =
    Arc<dyn Fn(&Cx, &Args, &R) -> Result<(), PipelineError> + Send + Sync>;

/// 拦截器的续延：恰好调用一次以推进到下一层（或内部调用）。
pub type Next<'a, R> = Box<dyn FnOnce() -> Result<R, PipelineError> + Send + 'a>;

/// 同步拦截器：环绕内部调用，可在续延前后插入逻辑，也可短路。
pub type InterceptorFn<Cx, Args, R> = Arc<
    dyn for<'a> Fn(&'a Cx, Next<'a, R>, &'a Args) -> Result<R, PipelineError> + Send + Sync,
>;

/// 组合完成的同步拦截器链，形状与单个拦截器一致。
pub type ChainFn<Cx, Args, R> = InterceptorFn<Cx, Args, R>;

/// 异步拦截器的续延。
pub type AsyncNext<'a, R> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<R, PipelineError>> + Send + 'a>;

/// 异步拦截器：环绕异步内部调用。
pub type AsyncInterceptorFn<Cx, Args, R> = Arc<
    dyn for<'a> Fn(&'a Cx, AsyncNext<'a, R>, &'a Args) -> BoxFuture<'a, Result<R, PipelineError>>
        + Send
        + Sync,
>;

/// 组合完成的异步拦截器链。
pub type AsyncChainFn<Cx, Args, R> = AsyncInterceptorFn<Cx, Args, R>;

fn chain_fn<Cx, Args, R>(
    f: impl for<'a> Fn(&'a Cx, Next<'a, R>, &'a Args) -> Result<R, PipelineError>
    + Send
    + Sync
    + 'static,
) -> ChainFn<Cx, Args, R> {
    Arc::new(f)
}

fn async_chain_fn<Cx, Args, R>(
    f: impl for<'a> Fn(&'a Cx, AsyncNext<'a, R>, &'a Args) -> BoxFuture<'a, Result<R, PipelineError>>
    + Send
    + Sync
    + 'static,
) -> AsyncChainFn<Cx, Args, R> {
    Arc::new(f)
}

/// 四个旁路阶段的有序钩子存储，按注册顺序执行。
struct StageHooks<Cx, Args, R> {
    authenticate: RwLock<Vec<HookFn<Cx, Args>>>,
    authorize: RwLock<Vec<HookFn<Cx, Args>>>,
    pre_invoke: RwLock<Vec<HookFn<Cx, Args>>>,
    post_invoke: RwLock<Vec<PostHookFn<Cx, Args, R>>>,
}

impl<Cx, Args, R> StageHooks<Cx, Args, R> {
    fn new() -> Self {
        Self {
            authenticate: RwLock::new(Vec::new()),
            authorize: RwLock::new(Vec::new()),
            pre_invoke: RwLock::new(Vec::new()),
            post_invoke: RwLock::new(Vec::new()),
        }
    }
}

/// 同步操作的行为集合。
///
/// # 契约说明（What）
/// - 钩子与拦截器均按注册顺序排列；
/// - 所有注册方法通过内部可变性接受 `&self` 并返回 `&Self`，支持链式调用；
/// - `interceptor_chain` 首次调用时组合并缓存拦截器链（见模块级说明）。
pub struct OperationBehavior<Cx, Args, R> {
    hooks: StageHooks<Cx, Args, R>,
    interceptors: RwLock<Vec<InterceptorFn<Cx, Args, R>>>,
    chain: Once<ChainFn<Cx, Args, R>>,
}

impl<Cx, Args, R> OperationBehavior<Cx, Args, R>
where
    Cx: Send + Sync + 'static,
    Args: ArgBundle,
    R: Send + 'static,
{
    /// 创建空行为集合。
    pub fn new() -> Self {
        Self {
            hooks: StageHooks::new(),
            interceptors: RwLock::new(Vec::new()),
            chain: Once::new(),
        }
    }

    /// 追加认证钩子。
    pub fn authenticate(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.authenticate.write().push(Arc::new(hook));
        self
    }

    /// 追加授权钩子。
    pub fn authorize(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.authorize.write().push(Arc::new(hook));
        self
    }

    /// 追加前置钩子。
    pub fn pre_invoke(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.pre_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加后置钩子（可观察返回值）。
    pub fn post_invoke(
        &self,
        hook: impl Fn(&Cx, &Args, &R) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.post_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加拦截器。
    ///
    /// # 风险提示（Trade-offs）
    /// - 拦截器链在首次派发时冻结，此后的注册不影响已缓存的链。
    pub fn intercept(
        &self,
        interceptor: impl for<'a> Fn(&'a Cx, Next<'a, R>, &'a Args) -> Result<R, PipelineError>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.interceptors.write().push(Arc::new(interceptor));
        self
    }

    /// 取出（必要时一次性组合）拦截器链。
    ///
    /// # 契约说明（What）
    /// - **后置条件**：先注册的拦截器位于链的最外层；无拦截器时链退化为
    ///   透传续延；
    /// - 并发首调只会组合一次，竞争方自旋等待组合完成。
    pub fn interceptor_chain(&self) -> ChainFn<Cx, Args, R> {
        self.chain
            .call_once(|| Self::compose(self.interceptors.read().clone()))
            .clone()
    }

    fn compose(layers: Vec<InterceptorFn<Cx, Args, R>>) -> ChainFn<Cx, Args, R> {
        let mut chain = chain_fn::<Cx, Args, R>(|_cx, next, _args| next());
        // 逆序包裹使先注册者成为最外层。
        for layer in layers.into_iter().rev() {
            let inner = chain;
            chain = chain_fn(move |cx, next, args| {
                let inner = inner.clone();
                layer(cx, Box::new(move || inner(cx, next, args)), args)
            });
        }
        chain
    }

    pub(crate) fn authenticate_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.authenticate.read().clone()
    }

    pub(crate) fn authorize_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.authorize.read().clone()
    }

    pub(crate) fn pre_invoke_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.pre_invoke.read().clone()
    }

    pub(crate) fn post_invoke_hooks(&self) -> Vec<PostHookFn<Cx, Args, R>> {
        self.hooks.post_invoke.read().clone()
    }
}

impl<Cx, Args, R> Default for OperationBehavior<Cx, Args, R>
where
    Cx: Send + Sync + 'static,
    Args: ArgBundle,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 异步操作的行为集合。
///
/// # 契约说明（What）
/// - 旁路四阶段与同步版本共享同一套同步钩子形态（管道中只有内部调用被
///   `await`）；
/// - 拦截器与链为异步形态，组合与冻结规则同 [`OperationBehavior`]。
pub struct AsyncOperationBehavior<Cx, Args, R> {
    hooks: StageHooks<Cx, Args, R>,
    interceptors: RwLock<Vec<AsyncInterceptorFn<Cx, Args, R>>>,
    chain: Once<AsyncChainFn<Cx, Args, R>>,
}

impl<Cx, Args, R> AsyncOperationBehavior<Cx, Args, R>
where
    Cx: Send + Sync + 'static,
    Args: ArgBundle,
    R: Send + 'static,
{
    /// 创建空行为集合。
    pub fn new() -> Self {
        Self {
            hooks: StageHooks::new(),
            interceptors: RwLock::new(Vec::new()),
            chain: Once::new(),
        }
    }

    /// 追加认证钩子。
    pub fn authenticate(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.authenticate.write().push(Arc::new(hook));
        self
    }

    /// 追加授权钩子。
    pub fn authorize(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.authorize.write().push(Arc::new(hook));
        self
    }

    /// 追加前置钩子。
    pub fn pre_invoke(
        &self,
        hook: impl Fn(&Cx, &Args) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.pre_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加后置钩子（可观察返回值）。
    pub fn post_invoke(
        &self,
        hook: impl Fn(&Cx, &Args, &R) -> Result<(), PipelineError> + Send + Sync + 'static,
    ) -> &Self {
        self.hooks.post_invoke.write().push(Arc::new(hook));
        self
    }

    /// 追加异步拦截器，冻结规则同 [`OperationBehavior::intercept`]。
    pub fn intercept(
        &self,
        interceptor: impl for<'a> Fn(
            &'a Cx,
            AsyncNext<'a, R>,
            &'a Args,
        ) -> BoxFuture<'a, Result<R, PipelineError>>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.interceptors.write().push(Arc::new(interceptor));
        self
    }

    /// 取出（必要时一次性组合）异步拦截器链。
    pub fn interceptor_chain(&self) -> AsyncChainFn<Cx, Args, R> {
        self.chain
            .call_once(|| Self::compose(self.interceptors.read().clone()))
            .clone()
    }

    fn compose(layers: Vec<AsyncInterceptorFn<Cx, Args, R>>) -> AsyncChainFn<Cx, Args, R> {
        let mut chain = async_chain_fn::<Cx, Args, R>(|_cx, next, _args| next());
        for layer in layers.into_iter().rev() {
            let inner = chain;
            chain = async_chain_fn(move |cx, next, args| {
                let inner = inner.clone();
                layer(cx, Box::new(move || inner(cx, next, args)), args)
            });
        }
        chain
    }

    pub(crate) fn authenticate_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.authenticate.read().clone()
    }

    pub(crate) fn authorize_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.authorize.read().clone()
    }

    pub(crate) fn pre_invoke_hooks(&self) -> Vec<HookFn<Cx, Args>> {
        self.hooks.pre_invoke.read().clone()
    }

    pub(crate) fn post_invoke_hooks(&self) -> Vec<PostHookFn<Cx, Args, R>> {
        self.hooks.post_invoke.read().clone()
    }
}

impl<Cx, Args, R> Default for AsyncOperationBehavior<Cx, Args, R>
where
    Cx: Send + Sync + 'static,
    Args: ArgBundle,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    type Ctx = ();

    /// 空链应退化为透传续延，结果与直接调用一致。
    #[test]
    fn empty_chain_is_passthrough() {
        let behavior = OperationBehavior::<Ctx, (i32,), i32>::new();
        let chain = behavior.interceptor_chain();
        let args = (7,);
        let out = chain(&(), Box::new(|| Ok(41)), &args);
        assert_eq!(out.expect("透传链不应失败"), 41);
    }

    /// 先注册的拦截器必须位于最外层（before 先执行、after 后执行）。
    #[test]
    fn first_registered_interceptor_is_outermost() {
        use std::sync::Mutex;

        static TRACE: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        let behavior = OperationBehavior::<Ctx, (), i32>::new();
        behavior
            .intercept(|cx, next, args| {
                TRACE.lock().expect("锁不可中毒").push("i1-before");
                let out = next();
                TRACE.lock().expect("锁不可中毒").push("i1-after");
                let _ = (cx, args);
                out
            })
            .intercept(|_cx, next, _args| {
                TRACE.lock().expect("锁不可中毒").push("i2-before");
                let out = next();
                TRACE.lock().expect("锁不可中毒").push("i2-after");
                out
            });

        let chain = behavior.interceptor_chain();
        let args = ();
        let out = chain(
            &(),
            Box::new(|| {
                TRACE.lock().expect("锁不可中毒").push("inner");
                Ok(1)
            }),
            &args,
        );
        assert_eq!(out.expect("链上无失败路径"), 1);
        assert_eq!(
            *TRACE.lock().expect("锁不可中毒"),
            vec!["i1-before", "i2-before", "inner", "i2-after", "i1-after"],
            "洋葱次序：先注册者在最外层"
        );
    }

    /// 链在首次取用后冻结，后续注册不改变已缓存的链。
    #[test]
    fn chain_is_frozen_after_first_build() {
        let behavior = OperationBehavior::<Ctx, (), String>::new();
        let first = behavior.interceptor_chain();

        behavior.intercept(|_cx, next, _args| next().map(|s| s + "-late"));
        let second = behavior.interceptor_chain();

        let args = ();
        let out = second(&(), Box::new(|| Ok(String::from("base"))), &args);
        assert_eq!(out.expect("链上无失败路径"), "base", "冻结后注册的拦截器不得生效");
        let _ = first;
    }
}
