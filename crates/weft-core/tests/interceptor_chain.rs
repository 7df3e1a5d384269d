//! 拦截器洋葱模型的组合次序、短路与冻结语义。

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use weft_core::prelude::*;

type Trace = Arc<Mutex<Vec<String>>>;

fn record(trace: &Trace, label: impl Into<String>) {
    trace.lock().expect("轨迹锁不可中毒").push(label.into());
}

fn snapshot(trace: &Trace) -> Vec<String> {
    trace.lock().expect("轨迹锁不可中毒").clone()
}

/// 先注册的拦截器位于最外层：I1-before → I2-before → inner → I2-after → I1-after。
#[test]
fn first_registered_is_outermost() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let behavior = OperationBehavior::<(), (i32,), i32>::new();

    let t1 = Arc::clone(&trace);
    let t2 = Arc::clone(&trace);
    behavior
        .intercept(move |_cx, next, _args| {
            record(&t1, "i1-before");
            let out = next();
            record(&t1, "i1-after");
            out
        })
        .intercept(move |_cx, next, _args| {
            record(&t2, "i2-before");
            let out = next();
            record(&t2, "i2-after");
            out
        });

    let chain = behavior.interceptor_chain();
    let args = (10,);
    let inner_trace = Arc::clone(&trace);
    let out = chain(
        &(),
        Box::new(move || {
            record(&inner_trace, "inner");
            Ok(10)
        }),
        &args,
    );
    assert_eq!(out.expect("链上无失败路径"), 10);
    assert_eq!(
        snapshot(&trace),
        vec!["i1-before", "i2-before", "inner", "i2-after", "i1-after"]
    );
}

/// 拦截器可以不调用续延而短路：内部调用不执行，返回值由拦截器给出。
#[test]
fn interceptor_may_short_circuit() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let behavior = OperationBehavior::<(), (), i32>::new();
    behavior.intercept(|_cx, _next, _args| Ok(-1));

    let chain = behavior.interceptor_chain();
    let args = ();
    let inner_trace = Arc::clone(&trace);
    let out = chain(
        &(),
        Box::new(move || {
            record(&inner_trace, "inner");
            Ok(1)
        }),
        &args,
    );
    assert_eq!(out.expect("短路返回"), -1);
    assert!(snapshot(&trace).is_empty(), "短路时内部调用不得执行");
}

/// 拦截器返回错误会进入 Fault 包装路径（经调度器验证）。
#[test]
fn interceptor_error_becomes_fault() {
    #[derive(Clone)]
    struct Ctx;

    trait Echo: Send + Sync {
        fn echo(&self, v: i32) -> Result<i32, PipelineError>;
    }

    struct EchoService;
    impl Echo for EchoService {
        fn echo(&self, v: i32) -> Result<i32, PipelineError> {
            Ok(v)
        }
    }

    let contract = Arc::new(ContractBehavior::<Ctx, dyn Echo>::new());
    contract
        .authenticate(|_cx, _args| Ok(()))
        .authorize(|_cx, _args| Ok(()));
    contract
        .operation::<(i32,), i32>("echo")
        .intercept(|_cx, _next, _args| {
            Err(PipelineError::application("echo.vetoed", "被拦截器否决"))
        });

    let dispatcher = ProxyDispatcher::new(
        Arc::new(EchoService) as Arc<dyn Echo>,
        Ctx,
        Arc::clone(&contract),
    );
    let err = dispatcher
        .invoke("echo", (7,), |svc, args| svc.echo(args.0))
        .expect_err("拦截器否决必须失败");
    assert_eq!(err.kind(), PipelineErrorKind::Fault);
    assert!(
        err.message().contains("echo.vetoed"),
        "Fault 文案应包含原始错误信息"
    );
}

/// 链在首次组合后冻结：晚注册的拦截器不得出现在已缓存的链上。
#[test]
fn late_registration_does_not_affect_built_chain() {
    let behavior = OperationBehavior::<(), (), i32>::new();
    let _ = behavior.interceptor_chain();

    behavior.intercept(|_cx, next, _args| next().map(|v| v + 100));
    let chain = behavior.interceptor_chain();
    let args = ();
    let out = chain(&(), Box::new(|| Ok(1)), &args);
    assert_eq!(out.expect("链上无失败路径"), 1, "冻结后的链不得包含晚注册者");
}

proptest! {
    /// 任意 1..=6 个拦截器的洋葱次序：before 按注册序、after 按逆序。
    #[test]
    fn onion_ordering_holds_for_any_depth(depth in 1usize..=6) {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let behavior = OperationBehavior::<(), (), u32>::new();

        for index in 0..depth {
            let t = Arc::clone(&trace);
            behavior.intercept(move |_cx, next, _args| {
                record(&t, format!("before-{index}"));
                let out = next();
                record(&t, format!("after-{index}"));
                out
            });
        }

        let chain = behavior.interceptor_chain();
        let args = ();
        let inner_trace = Arc::clone(&trace);
        let out = chain(
            &(),
            Box::new(move || {
                record(&inner_trace, "inner");
                Ok(0)
            }),
            &args,
        );
        prop_assert_eq!(out.expect("链上无失败路径"), 0);

        let mut expected: Vec<String> = (0..depth).map(|i| format!("before-{i}")).collect();
        expected.push("inner".to_string());
        expected.extend((0..depth).rev().map(|i| format!("after-{i}")));
        prop_assert_eq!(snapshot(&trace), expected);
    }
}
