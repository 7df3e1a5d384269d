//! 以契约类型为键的工厂配置。
//!
//! # 设计背景（Why）
//! - 一个进程内通常存在多个服务契约，各自携带独立的钩子与代理策略；
//!   工厂配置以 `TypeId` 为键聚合全部契约行为，是装配期的单一入口；
//! - 装配与取用语义刻意不对称：`for_contract` 是 get-or-create（配置期
//!   宽松），`create_proxy` 只查不建（运行期严格）——未注册契约的代理
//!   请求是配置错误，需要直通语义时必须显式选择 `no_proxy()`。

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;

use spin::RwLock;

use crate::error::PipelineError;
use crate::pipeline::ContractBehavior;

/// 契约行为的聚合注册表。
///
/// # 契约说明（What）
/// - **幂等性**：[`Self::for_contract`] 对同一契约类型反复调用返回同一份
///   行为句柄；
/// - [`Self::create_proxy`] 在契约未注册时返回配置错误，不做隐式直通。
pub struct FactoryConfiguration<Cx> {
    contracts: RwLock<BTreeMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    _context: PhantomData<fn() -> Cx>,
}

impl<Cx> FactoryConfiguration<Cx>
where
    Cx: Send + Sync + 'static,
{
    /// 创建空配置。
    pub fn new() -> Self {
        Self {
            contracts: RwLock::new(BTreeMap::new()),
            _context: PhantomData,
        }
    }

    /// 取用（必要时创建）契约的行为配置。
    pub fn for_contract<C>(&self) -> Arc<ContractBehavior<Cx, C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = TypeId::of::<C>();
        if let Some(entry) = self.contracts.read().get(&key) {
            if let Ok(behavior) = Arc::downcast::<ContractBehavior<Cx, C>>(entry.clone()) {
                return behavior;
            }
        }

        let mut guard = self.contracts.write();
        // 双重检查：竞争方可能已在获取写锁前完成插入。
        if let Some(entry) = guard.get(&key) {
            if let Ok(behavior) = Arc::downcast::<ContractBehavior<Cx, C>>(entry.clone()) {
                return behavior;
            }
        }
        let behavior = Arc::new(ContractBehavior::<Cx, C>::new());
        guard.insert(key, behavior.clone() as Arc<dyn Any + Send + Sync>);
        behavior
    }

    /// 按已注册的代理策略装配实例。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：契约已通过 [`Self::for_contract`] 注册并显式选择了
    ///   代理策略；
    /// - **后置条件**：未注册契约返回 [`crate::error::codes::CONFIGURATION_INVALID`]
    ///   配置错误。
    pub fn create_proxy<C>(&self, service: Arc<C>, context: Cx) -> Result<Arc<C>, PipelineError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let entry = self.contracts.read().get(&TypeId::of::<C>()).cloned();
        match entry.and_then(|entry| Arc::downcast::<ContractBehavior<Cx, C>>(entry).ok()) {
            Some(behavior) => behavior.create(service, context),
            None => Err(PipelineError::configuration(format!(
                "契约 `{}` 未注册代理配置：需要直通语义时必须显式调用 no_proxy()",
                type_name::<C>()
            ))),
        }
    }
}

impl<Cx> Default for FactoryConfiguration<Cx>
where
    Cx: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
