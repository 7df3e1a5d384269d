//! 管道阶段枚举。

use core::fmt;

/// 五阶段管道的阶段标识。
///
/// # 契约说明（What）
/// - 阶段次序固定：`Authenticate → Authorize → PreInvoke → InnerInvoke → PostInvoke`；
/// - 调度器与观察者事件共用该枚举，`as_str()` 同时充当错误钩子的 `source` 标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Authenticate,
    Authorize,
    PreInvoke,
    InnerInvoke,
    PostInvoke,
}

impl Stage {
    /// 阶段的稳定字符串标识。
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Authenticate => "Authenticate",
            Stage::Authorize => "Authorize",
            Stage::PreInvoke => "PreInvoke",
            Stage::InnerInvoke => "InnerInvoke",
            Stage::PostInvoke => "PostInvoke",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
