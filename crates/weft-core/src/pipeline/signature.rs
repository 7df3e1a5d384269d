//! 操作签名：操作注册表的复合键。
//!
//! # 设计背景（Why）
//! - 同一契约允许同名重载操作（参数或返回类型不同），仅以名称作键会让
//!   重载互相覆盖；
//! - 签名把“名称 + 参数类型序列 + 返回类型 + 同步/异步口味”编码为一个
//!   可排序的值，使注册表天然隔离重载，也让同步/异步同名操作互不干扰。

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::any::TypeId;

use crate::args::ArgBundle;

/// 操作的同步/异步口味。
///
/// # 契约说明（What）
/// - 同名同参的同步与异步操作是两个独立的注册表条目。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationFlavor {
    Sync,
    Async,
}

/// 操作签名：注册与查找共用的复合键。
///
/// # 契约说明（What）
/// - **不变量**：`args` 的顺序与操作声明顺序一致；
/// - 键实现 `Ord`，可直接用于 `BTreeMap` 注册表。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationSignature {
    name: Cow<'static, str>,
    args: Vec<TypeId>,
    result: TypeId,
    flavor: OperationFlavor,
}

impl OperationSignature {
    /// 由强类型参数束与返回类型构造签名。
    pub fn of<Args: ArgBundle, R: 'static>(
        name: impl Into<Cow<'static, str>>,
        flavor: OperationFlavor,
    ) -> Self {
        Self {
            name: name.into(),
            args: Args::type_ids(),
            result: TypeId::of::<R>(),
            flavor,
        }
    }

    /// 操作名称。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数个数。
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// 同步/异步口味。
    pub fn flavor(&self) -> OperationFlavor {
        self.flavor
    }
}
