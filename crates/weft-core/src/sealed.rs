//! 内部 sealed 模块用于控制外部扩展边界。
//!
//! # 设计背景（Why）
//! - `weft-core` 对外暴露可实现的参数束 Trait，需要在 SemVer 框架下保留演进空间。
//! - 通过统一的 `Sealed` 标记，可以在不破坏公开 API 的情况下为 Trait 增加默认方法。
//!
//! # 逻辑解析（How）
//! - 定义私有模块级 Trait `Sealed`，并提供 blanket 实现；
//! - 对外 Trait 以 `: crate::sealed::Sealed` 间接依赖该标记；
//! - 若未来需要限制实现者集合，可在此处收紧 blanket 实现条件。

pub trait Sealed {}

impl<T: ?Sized> Sealed for T {}
