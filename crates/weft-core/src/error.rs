//! 管道统一错误模型。
//!
//! # 设计背景（Why）
//! - 五阶段管道中每个阶段都可能失败，但失败的“翻译规则”并不相同：
//!   认证/授权/前置/后置阶段的错误必须原样上抛，只有内部调用阶段的错误
//!   会被包装为 `Fault`；
//! - 为了让调用方能够以机器可读的方式分流处理，错误同时携带稳定的
//!   `&'static str` 错误码（见 [`codes`]）与语义分类 [`PipelineErrorKind`]。
//!
//! # 契约说明（What）
//! - `Display` 输出格式固定为 `"[{code}] {message}"`；
//! - 错误链通过 [`core::error::Error::source`] 暴露，`Fault` 包装错误必然
//!   携带原始错误作为 `source`。

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use core::fmt;

/// 错误链节点的统一对象安全形态。
pub type ErrorCause = Box<dyn core::error::Error + Send + Sync + 'static>;

/// 错误的语义分类，决定调用方的分流策略。
///
/// # 契约说明（What）
/// - `Authentication` / `Authorization`：封闭策略拒绝或钩子显式拒绝；
/// - `Configuration`：工厂或契约配置被误用（如契约未注册）；
/// - `Fault`：内部调用阶段失败后的包装错误，必然携带原始错误；
/// - `Application`：用户钩子或服务自身的业务错误。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineErrorKind {
    Authentication,
    Authorization,
    Configuration,
    Fault,
    Application,
}

/// 稳定错误码常量，命名遵循 `<域>.<语义>`。
///
/// # 设计背景（Why）
/// - 错误码是跨版本稳定的机器可读契约，文案（message）允许演进而错误码不允许；
/// - 集中定义避免散落的字符串字面量产生拼写分叉。
pub mod codes {
    /// 认证钩子显式拒绝了调用。
    pub const AUTHENTICATION_DENIED: &str = "pipeline.authentication_denied";
    /// 认证阶段没有任何钩子，封闭策略拒绝调用。
    pub const AUTHENTICATION_MISSING: &str = "pipeline.authentication_missing";
    /// 授权钩子显式拒绝了调用。
    pub const AUTHORIZATION_DENIED: &str = "pipeline.authorization_denied";
    /// 授权阶段没有任何钩子，封闭策略拒绝调用。
    pub const AUTHORIZATION_MISSING: &str = "pipeline.authorization_missing";
    /// 工厂或契约配置被误用。
    pub const CONFIGURATION_INVALID: &str = "pipeline.configuration_invalid";
    /// 内部调用阶段失败后的 Fault 包装。
    pub const INNER_FAULT: &str = "pipeline.inner_fault";
}

/// 管道统一错误类型。
///
/// # 契约说明（What）
/// - **不变量**：`kind == Fault` 时 `cause` 必为 `Some`，原始错误可经
///   `source()` 取回；
/// - `code` 为稳定常量，`message` 为人类可读文案，允许携带动态上下文。
#[derive(Debug)]
pub struct PipelineError {
    kind: PipelineErrorKind,
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

impl PipelineError {
    /// 认证钩子拒绝调用。
    pub fn authentication(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: PipelineErrorKind::Authentication,
            code: codes::AUTHENTICATION_DENIED,
            message: message.into(),
            cause: None,
        }
    }

    /// 认证阶段零钩子时的封闭拒绝。
    pub fn authentication_missing(operation: &str) -> Self {
        Self {
            kind: PipelineErrorKind::Authentication,
            code: codes::AUTHENTICATION_MISSING,
            message: Cow::Owned(format!("操作 `{operation}` 未注册任何认证钩子，按封闭策略拒绝调用")),
            cause: None,
        }
    }

    /// 授权钩子拒绝调用。
    pub fn authorization(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: PipelineErrorKind::Authorization,
            code: codes::AUTHORIZATION_DENIED,
            message: message.into(),
            cause: None,
        }
    }

    /// 授权阶段零钩子时的封闭拒绝。
    pub fn authorization_missing(operation: &str) -> Self {
        Self {
            kind: PipelineErrorKind::Authorization,
            code: codes::AUTHORIZATION_MISSING,
            message: Cow::Owned(format!("操作 `{operation}` 未注册任何授权钩子，按封闭策略拒绝调用")),
            cause: None,
        }
    }

    /// 工厂或契约配置被误用。
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: PipelineErrorKind::Configuration,
            code: codes::CONFIGURATION_INVALID,
            message: message.into(),
            cause: None,
        }
    }

    /// 用户钩子或服务自身的业务错误。
    ///
    /// # 契约说明（What）
    /// - `code` 由调用方给出，应与 [`codes`] 一样保持 `<域>.<语义>` 命名并跨版本稳定。
    pub fn application(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: PipelineErrorKind::Application,
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 将内部调用阶段的失败包装为 `Fault`。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`cause` 是内部调用或拦截器链返回的原始错误；
    /// - **后置条件**：返回值的 `message` 为 `"Fault: " + 原始错误文案`，
    ///   原始错误保留在 `source()` 链上。
    pub fn fault(cause: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self {
            kind: PipelineErrorKind::Fault,
            code: codes::INNER_FAULT,
            message: Cow::Owned(format!("Fault: {cause}")),
            cause: Some(Box::new(cause)),
        }
    }

    /// 在现有错误上补充底层原因。
    #[must_use]
    pub fn with_cause(mut self, cause: impl core::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 错误的语义分类。
    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 人类可读文案。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否为内部调用阶段的 `Fault` 包装。
    pub fn is_fault(&self) -> bool {
        matches!(self.kind, PipelineErrorKind::Fault)
    }

    /// 直接借用底层原因（等价于 `source()`，但保留 `Send + Sync` 约束）。
    pub fn cause(&self) -> Option<&(dyn core::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl core::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn core::error::Error + 'static))
    }
}
