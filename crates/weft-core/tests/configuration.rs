//! 工厂配置、代理策略与封闭策略的契约测试。

use std::sync::{Arc, Mutex};

use weft_core::prelude::*;

#[derive(Clone)]
struct AmbientCtx {
    trace: Arc<Mutex<Vec<String>>>,
}

impl AmbientCtx {
    fn new() -> Self {
        Self {
            trace: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, label: impl Into<String>) {
        self.trace.lock().expect("轨迹锁不可中毒").push(label.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.trace.lock().expect("轨迹锁不可中毒").clone()
    }
}

trait Ledger: Send + Sync + std::fmt::Debug {
    fn credit(&self, amount: i64) -> Result<i64, PipelineError>;
}

#[derive(Debug)]
struct LedgerService;

impl Ledger for LedgerService {
    fn credit(&self, amount: i64) -> Result<i64, PipelineError> {
        Ok(amount)
    }
}

struct LedgerProxy {
    dispatcher: ProxyDispatcher<AmbientCtx, dyn Ledger>,
}

impl std::fmt::Debug for LedgerProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerProxy").finish_non_exhaustive()
    }
}

impl Ledger for LedgerProxy {
    fn credit(&self, amount: i64) -> Result<i64, PipelineError> {
        self.dispatcher
            .invoke("credit", (amount,), |svc, args| svc.credit(args.0))
    }
}

fn install_proxy(contract: &ContractBehavior<AmbientCtx, dyn Ledger>) {
    contract.with_proxy(|service, context, behavior| {
        Arc::new(LedgerProxy {
            dispatcher: ProxyDispatcher::new(service, context, behavior),
        })
    });
}

/// 未注册契约的代理请求是配置错误，不做隐式直通。
#[test]
fn unregistered_contract_is_a_configuration_error() {
    let configuration = FactoryConfiguration::<AmbientCtx>::new();
    let err = configuration
        .create_proxy::<dyn Ledger>(Arc::new(LedgerService), AmbientCtx::new())
        .expect_err("未注册契约必须失败");
    assert_eq!(err.kind(), PipelineErrorKind::Configuration);
    assert_eq!(err.code(), codes::CONFIGURATION_INVALID);
}

/// 已注册但未选择代理策略同样是配置错误。
#[test]
fn registered_contract_without_strategy_is_rejected() {
    let configuration = FactoryConfiguration::<AmbientCtx>::new();
    let _ = configuration.for_contract::<dyn Ledger>();
    let err = configuration
        .create_proxy::<dyn Ledger>(Arc::new(LedgerService), AmbientCtx::new())
        .expect_err("未选择策略必须失败");
    assert_eq!(err.kind(), PipelineErrorKind::Configuration);
}

/// 显式直通：返回与入参相同的服务句柄（指针相等），不经任何管道阶段。
#[test]
fn no_proxy_returns_the_same_service_handle() {
    let factory = ProxyFactory::<AmbientCtx>::new();
    factory.for_contract::<dyn Ledger>().no_proxy();

    let service: Arc<dyn Ledger> = Arc::new(LedgerService);
    let out = factory
        .create_proxy::<dyn Ledger>(Arc::clone(&service), AmbientCtx::new())
        .expect("直通策略不应失败");
    assert!(Arc::ptr_eq(&service, &out), "直通必须返回同一服务句柄");
}

/// 代理策略互斥：后设置者覆盖先设置者（两个方向都成立）。
#[test]
fn proxy_strategies_are_mutually_exclusive() {
    // 先工厂后直通：最终为直通。
    let factory = ProxyFactory::<AmbientCtx>::new();
    let contract = factory.for_contract::<dyn Ledger>();
    install_proxy(&contract);
    contract.no_proxy();

    let service: Arc<dyn Ledger> = Arc::new(LedgerService);
    let out = factory
        .create_proxy::<dyn Ledger>(Arc::clone(&service), AmbientCtx::new())
        .expect("直通不应失败");
    assert!(Arc::ptr_eq(&service, &out), "no_proxy 应覆盖 with_proxy");

    // 先直通后工厂：最终为代理。
    let factory = ProxyFactory::<AmbientCtx>::new();
    let contract = factory.for_contract::<dyn Ledger>();
    contract.no_proxy();
    install_proxy(&contract);

    let service: Arc<dyn Ledger> = Arc::new(LedgerService);
    let out = factory
        .create_proxy::<dyn Ledger>(Arc::clone(&service), AmbientCtx::new())
        .expect("装配不应失败");
    assert!(!Arc::ptr_eq(&service, &out), "with_proxy 应覆盖 no_proxy");
}

/// 契约与操作的 get-or-create 幂等性：反复取用得到同一份配置。
#[test]
fn contract_and_operation_lookup_is_idempotent() {
    let configuration = FactoryConfiguration::<AmbientCtx>::new();
    let first = configuration.for_contract::<dyn Ledger>();
    let second = configuration.for_contract::<dyn Ledger>();
    assert!(Arc::ptr_eq(&first, &second), "契约配置必须幂等");

    let op_a = first.operation::<(i64,), i64>("credit").behavior();
    let op_b = second.operation::<(i64,), i64>("credit").behavior();
    assert!(Arc::ptr_eq(&op_a, &op_b), "操作配置必须幂等");
}

/// 同名重载互不干扰：参数类型不同的两个 `credit` 各自持有独立钩子。
#[test]
fn overloads_keep_independent_behaviors() {
    let contract = Arc::new(ContractBehavior::<AmbientCtx, dyn Ledger>::new());
    contract
        .authenticate(|_cx, _args| Ok(()))
        .authorize(|_cx, _args| Ok(()));

    contract
        .operation::<(i64,), i64>("credit")
        .pre_invoke(|cx, _args| {
            cx.record("i64-pre");
            Ok(())
        });
    contract
        .operation::<(i64, i64), i64>("credit")
        .pre_invoke(|cx, _args| {
            cx.record("pair-pre");
            Ok(())
        });

    let ctx = AmbientCtx::new();
    let dispatcher = ProxyDispatcher::new(
        Arc::new(LedgerService) as Arc<dyn Ledger>,
        ctx.clone(),
        Arc::clone(&contract),
    );

    dispatcher
        .invoke("credit", (5_i64,), |svc, args| svc.credit(args.0))
        .expect("一元重载不应失败");
    dispatcher
        .invoke("credit", (5_i64, 7_i64), |svc, args| svc.credit(args.0 + args.1))
        .expect("二元重载不应失败");

    assert_eq!(
        ctx.snapshot(),
        vec!["i64-pre", "pair-pre"],
        "各重载只应命中自己的钩子"
    );
}

/// 封闭策略（精确命中路径）：零认证钩子直接拒绝。
#[test]
fn zero_authentication_hooks_fail_closed() {
    let contract = Arc::new(ContractBehavior::<AmbientCtx, dyn Ledger>::new());
    contract.operation::<(i64,), i64>("credit");

    let dispatcher = ProxyDispatcher::new(
        Arc::new(LedgerService) as Arc<dyn Ledger>,
        AmbientCtx::new(),
        Arc::clone(&contract),
    );
    let err = dispatcher
        .invoke("credit", (1_i64,), |svc, args| svc.credit(args.0))
        .expect_err("零认证钩子必须拒绝");
    assert_eq!(err.code(), codes::AUTHENTICATION_MISSING);
    assert_eq!(err.kind(), PipelineErrorKind::Authentication);
}

/// 封闭策略：认证通过但零授权钩子同样拒绝。
#[test]
fn zero_authorization_hooks_fail_closed() {
    let contract = Arc::new(ContractBehavior::<AmbientCtx, dyn Ledger>::new());
    contract.authenticate(|_cx, _args| Ok(()));

    let dispatcher = ProxyDispatcher::new(
        Arc::new(LedgerService) as Arc<dyn Ledger>,
        AmbientCtx::new(),
        Arc::clone(&contract),
    );
    let err = dispatcher
        .invoke("credit", (1_i64,), |svc, args| svc.credit(args.0))
        .expect_err("零授权钩子必须拒绝");
    assert_eq!(err.code(), codes::AUTHORIZATION_MISSING);
    assert_eq!(err.kind(), PipelineErrorKind::Authorization);
}

/// 封闭策略同样作用于回退路径：操作级钩子存在但签名未命中时，
/// 契约级钩子为零仍然拒绝。
#[test]
fn fallback_path_is_also_fail_closed() {
    let contract = Arc::new(ContractBehavior::<AmbientCtx, dyn Ledger>::new());
    // 操作级认证钩子注册在 (i64,) 签名上。
    contract
        .operation::<(i64,), i64>("credit")
        .authenticate(|_cx, _args| Ok(()))
        .authorize(|_cx, _args| Ok(()));

    let dispatcher = ProxyDispatcher::new(
        Arc::new(LedgerService) as Arc<dyn Ledger>,
        AmbientCtx::new(),
        Arc::clone(&contract),
    );
    // 以 (i32,) 调用：签名未命中，回退路径上契约级钩子为零。
    let err = dispatcher
        .invoke("credit", (1_i32,), |svc, args| svc.credit(i64::from(args.0)))
        .expect_err("回退路径零钩子必须拒绝");
    assert_eq!(err.code(), codes::AUTHENTICATION_MISSING);
}

/// 工厂门面是纯委托：行为与直接操作配置一致。
#[test]
fn factory_facade_delegates_to_configuration() {
    let factory = ProxyFactory::<AmbientCtx>::new();
    let via_facade = factory.for_contract::<dyn Ledger>();
    let via_configuration = factory.configuration().for_contract::<dyn Ledger>();
    assert!(
        Arc::ptr_eq(&via_facade, &via_configuration),
        "门面与配置必须指向同一契约行为"
    );
}
