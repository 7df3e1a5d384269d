//! 代理工厂：配置对象之上的纯委托门面。

use alloc::sync::Arc;

use crate::configuration::FactoryConfiguration;
use crate::error::PipelineError;
use crate::pipeline::ContractBehavior;

/// 面向调用方的工厂门面。
///
/// # 契约说明（What）
/// - 仅做委托，不增加任何语义；行为以 [`FactoryConfiguration`] 为准。
pub struct ProxyFactory<Cx> {
    configuration: FactoryConfiguration<Cx>,
}

impl<Cx> ProxyFactory<Cx>
where
    Cx: Send + Sync + 'static,
{
    /// 以空配置创建工厂。
    pub fn new() -> Self {
        Self {
            configuration: FactoryConfiguration::new(),
        }
    }

    /// 以现有配置创建工厂。
    pub fn with_configuration(configuration: FactoryConfiguration<Cx>) -> Self {
        Self { configuration }
    }

    /// 借用底层配置。
    pub fn configuration(&self) -> &FactoryConfiguration<Cx> {
        &self.configuration
    }

    /// 委托 [`FactoryConfiguration::for_contract`]。
    pub fn for_contract<C>(&self) -> Arc<ContractBehavior<Cx, C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.configuration.for_contract::<C>()
    }

    /// 委托 [`FactoryConfiguration::create_proxy`]。
    pub fn create_proxy<C>(&self, service: Arc<C>, context: Cx) -> Result<Arc<C>, PipelineError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.configuration.create_proxy::<C>(service, context)
    }
}

impl<Cx> Default for ProxyFactory<Cx>
where
    Cx: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
