use alloc::boxed::Box;
use core::{future::Future, pin::Pin};

/// `BoxFuture` 是 `weft-core` 在 `no_std + alloc` 下使用的通用 Future 包装。
///
/// # 设计背景（Why）
/// - 统一异步操作的表达，避免为对象安全引入外部运行时依赖。
///
/// # 契约说明（What）
/// - 约束 Future 为 `Send + 'a`，可安全跨线程调度。
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `LocalBoxFuture` 封装 `!Send` Future。
///
/// # 契约说明（What）
/// - 仅受 `'a` 生命周期约束，供单线程执行器场景使用。
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
