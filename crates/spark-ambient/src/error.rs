//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义传播层的两个错误域：宿主存储拒绝读写时的 [`StoreError`]，
//!   以及任务执行结果统一承载的 [`TaskError`]；
//! - 委托体自身的失败必须原样穿透本层（见 [`TaskErrorKind::Failed`]），
//!   传播层唯一可能自行引入的失败来自恢复步骤，因此 [`TaskError`] 为
//!   "恢复也失败了"保留了被抑制（suppressed）的附加槽位。
//!
//! ## 设计要求（What）
//! - `StoreError` 走 `thiserror` 派生，与生态 `std::error::Error` 兼容；
//! - `TaskError` 手工实现 `Display`/`Error`：被抑制的恢复失败不能替换主失败，
//!   只能附着其后，这一层次关系派生宏表达不了。

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// 任务执行结果的统一别名。
pub type TaskResult<T = ()> = Result<T, TaskError>;

/// 宿主上下文存储拒绝读写时的错误。
///
/// # 契约说明（What）
/// - 默认的线程槽存储（[`crate::store::ThreadContextStore`]）不会产生这些错误；
///   它们为注入的宿主访问器保留：框架级 Holder 的 set/clear 是可能抛错的。
/// - 所有变体 `Clone + Eq`，便于在恢复合并逻辑与断言中搬运比较。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 存储拒绝安装给定上下文。
    #[error("ambient store rejected install: {reason}")]
    InstallRejected { reason: Cow<'static, str> },

    /// 存储拒绝清空槽位。
    #[error("ambient store rejected clear: {reason}")]
    ClearRejected { reason: Cow<'static, str> },
}

impl StoreError {
    /// 构造安装被拒错误。
    pub fn install_rejected(reason: impl Into<Cow<'static, str>>) -> Self {
        StoreError::InstallRejected {
            reason: reason.into(),
        }
    }

    /// 构造清空被拒错误。
    pub fn clear_rejected(reason: impl Into<Cow<'static, str>>) -> Self {
        StoreError::ClearRejected {
            reason: reason.into(),
        }
    }
}

/// 任务失败的分类。
///
/// # 契约说明（What）
/// - `Cancelled` / `Panicked` / `ExecutorTerminated` / `Timeout` 由执行面产生；
/// - `InvalidInput` 用于提交参数校验（例如零周期的定时任务）；
/// - `Failed` 承载委托体自身返回的失败，内容由委托方决定、本层不加工；
/// - `ContextInstall` / `ContextRestore` 是传播层唯一自行引入的失败：
///   安装或恢复步骤被宿主存储拒绝。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskErrorKind {
    Cancelled,
    Panicked,
    ExecutorTerminated,
    Timeout,
    InvalidInput(Cow<'static, str>),
    Failed(Cow<'static, str>),
    ContextInstall(StoreError),
    ContextRestore(StoreError),
}

/// 任务失败载体：主失败分类，外加可选的被抑制恢复失败。
///
/// # 设计背景（Why）
/// - 恢复步骤运行在"保证清理"路径上，它的失败不允许被悄悄吞掉；但当委托体
///   已经失败时，恢复失败也不允许喧宾夺主。层次关系同 try/finally +
///   addSuppressed：主失败保持原样，恢复失败作为附注携带。
///
/// # 契约说明（What）
/// - **前置条件**：通过各构造函数创建；`with_suppressed_restore` 只应在
///   委托体失败且恢复随后也失败时调用一次；
/// - **后置条件**：`kind()` 永远返回主失败；`suppressed_restore()` 返回附注（若有）；
///   `Display` 先呈现主失败，再追加附注描述。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskError {
    kind: TaskErrorKind,
    suppressed: Option<StoreError>,
}

impl TaskError {
    /// 任务在开始或执行中被取消。
    pub fn cancelled() -> Self {
        Self::from_kind(TaskErrorKind::Cancelled)
    }

    /// 委托体发生 panic。
    pub fn panicked() -> Self {
        Self::from_kind(TaskErrorKind::Panicked)
    }

    /// 执行面已经终止，任务不再会被运行。
    pub fn terminated() -> Self {
        Self::from_kind(TaskErrorKind::ExecutorTerminated)
    }

    /// 等待超时。
    pub fn timeout() -> Self {
        Self::from_kind(TaskErrorKind::Timeout)
    }

    /// 提交参数非法。
    pub fn invalid_input(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::from_kind(TaskErrorKind::InvalidInput(reason.into()))
    }

    /// 委托体自身报告的失败，内容原样保留。
    pub fn failed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::from_kind(TaskErrorKind::Failed(reason.into()))
    }

    /// 安装步骤被宿主存储拒绝。
    pub fn install_failed(source: StoreError) -> Self {
        Self::from_kind(TaskErrorKind::ContextInstall(source))
    }

    /// 委托体成功、但恢复步骤被宿主存储拒绝。
    pub fn restore_failed(source: StoreError) -> Self {
        Self::from_kind(TaskErrorKind::ContextRestore(source))
    }

    /// 在既有主失败上附着一条被抑制的恢复失败。
    pub fn with_suppressed_restore(mut self, source: StoreError) -> Self {
        self.suppressed = Some(source);
        self
    }

    /// 读取主失败分类。
    pub fn kind(&self) -> &TaskErrorKind {
        &self.kind
    }

    /// 读取被抑制的恢复失败（若有）。
    pub fn suppressed_restore(&self) -> Option<&StoreError> {
        self.suppressed.as_ref()
    }

    fn from_kind(kind: TaskErrorKind) -> Self {
        Self {
            kind,
            suppressed: None,
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskErrorKind::Cancelled => f.write_str("task cancelled")?,
            TaskErrorKind::Panicked => f.write_str("task panicked")?,
            TaskErrorKind::ExecutorTerminated => f.write_str("executor terminated")?,
            TaskErrorKind::Timeout => f.write_str("no task completed within the allotted time")?,
            TaskErrorKind::InvalidInput(reason) => write!(f, "invalid input: {reason}")?,
            TaskErrorKind::Failed(reason) => write!(f, "task failed: {reason}")?,
            TaskErrorKind::ContextInstall(source) => {
                write!(f, "context install failed: {source}")?
            }
            TaskErrorKind::ContextRestore(source) => {
                write!(f, "context restore failed: {source}")?
            }
        }
        if let Some(suppressed) = &self.suppressed {
            write!(f, "; suppressed context restore failure: {suppressed}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            TaskErrorKind::ContextInstall(source) | TaskErrorKind::ContextRestore(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}
