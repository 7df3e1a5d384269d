//! 参数束抽象：以元组统一表达 0..=6 元操作参数。
//!
//! # 设计背景（Why）
//! - 契约级钩子面向“整个契约的所有操作”，无法预知每个操作的参数类型，
//!   因此需要一个类型擦除的只读视图；
//! - 操作级钩子与拦截器则要求强类型参数。两种诉求由同一份参数束同时满足：
//!   强类型元组实现 [`ArgBundle`]，并可按 `&dyn ErasedArgs` 借出擦除视图。
//!
//! # 逻辑解析（How）
//! - [`ErasedArgs`] 是对象安全的索引访问接口，元素以 `&dyn Any` 暴露；
//! - [`ArgBundle`] 在其上追加 `type_ids()`，供操作签名编码参数类型；
//! - 通过宏为 0 至 6 元元组批量实现，元素要求 `Any + Send + Sync`。

use alloc::vec::Vec;
use core::any::{Any, TypeId};

/// 参数束的类型擦除只读视图。
///
/// # 契约说明（What）
/// - `get(i)` 在 `i < arity()` 时返回第 `i` 个参数的 `&dyn Any`，越界返回 `None`；
/// - 契约级钩子应通过 `downcast_ref` 按需还原具体类型，还原失败时应保守放行或拒绝，
///   而不是 panic。
pub trait ErasedArgs: Send + Sync {
    /// 参数个数。
    fn arity(&self) -> usize;

    /// 按位置借出参数的类型擦除引用。
    fn get(&self, index: usize) -> Option<&dyn Any>;
}

/// 强类型参数束：0..=6 元元组。
///
/// # 契约说明（What）
/// - `type_ids()` 返回参数类型的有序 `TypeId` 列表，用于区分同名重载操作；
/// - 该 Trait 经 [`crate::sealed::Sealed`] 控制扩展边界，新元数由本 crate 统一开放。
pub trait ArgBundle: ErasedArgs + Send + Sync + Sized + crate::sealed::Sealed + 'static {
    /// 参数类型的有序编码。
    fn type_ids() -> Vec<TypeId>;
}

macro_rules! impl_arg_bundle {
    ($arity:expr; $( $idx:tt => $ty:ident ),*) => {
        impl<$( $ty: Any + Send + Sync ),*> ErasedArgs for ( $( $ty, )* ) {
            fn arity(&self) -> usize {
                $arity
            }

            fn get(&self, index: usize) -> Option<&dyn Any> {
                match index {
                    $( $idx => Some(&self.$idx as &dyn Any), )*
                    _ => None,
                }
            }
        }

        impl<$( $ty: Any + Send + Sync ),*> ArgBundle for ( $( $ty, )* ) {
            fn type_ids() -> Vec<TypeId> {
                alloc::vec![ $( TypeId::of::<$ty>() ),* ]
            }
        }
    };
}

impl_arg_bundle!(0;);
impl_arg_bundle!(1; 0 => A0);
impl_arg_bundle!(2; 0 => A0, 1 => A1);
impl_arg_bundle!(3; 0 => A0, 1 => A1, 2 => A2);
impl_arg_bundle!(4; 0 => A0, 1 => A1, 2 => A2, 3 => A3);
impl_arg_bundle!(5; 0 => A0, 1 => A1, 2 => A2, 3 => A3, 4 => A4);
impl_arg_bundle!(6; 0 => A0, 1 => A1, 2 => A2, 3 => A3, 4 => A4, 5 => A5);
