//! # task 模块说明
//!
//! ## 角色定位（Why）
//! - 定义执行面接受的三种任务形态（[`RunnableTask`]、[`CallableTask`]、[`PeriodicTask`]），
//!   以及给它们加上"安装快照、运行委托、恢复原值"纪律的捕获包装
//!   （[`ContextRunnable`]、[`ContextCallable`]、[`PeriodicContextTask`]）。
//! - 全部包装共用一个通用原语 [`run_with_context`]：这是整份协议唯一的安装/恢复实现，
//!   配对不变式只需要在这一处成立。
//!
//! ## 调用协议（How）
//! 1. 读出执行线程当前上下文 `original`；
//! 2. 安装快照（快照为 `None` 时等价于清空槽位）；
//! 3. 运行委托体；
//! 4. 无论成功、失败还是 panic 展开，都恢复 `original`：为 `None` 则清空，否则重新安装；
//! 5. 委托体的结果或失败原样上抛，本层不包裹、不记录、不重试。
//!
//! ## 失败合并（What）
//! - 委托成功 + 恢复失败 → [`TaskErrorKind::ContextRestore`]；
//! - 委托失败 + 恢复失败 → 委托失败保持为主失败，恢复失败以 suppressed 附着；
//! - panic 展开路径上恢复由守卫兜底执行，此时的存储拒绝只能记录事件，
//!   因为展开中的线程没有结果通道可用。

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::context::{AmbientContext, ContextSnapshot};
use crate::error::{TaskError, TaskErrorKind, TaskResult};
use crate::store::ContextStore;

/// 一次性、无返回值的任务形态。
///
/// # 契约说明（What）
/// - `label` 供池内省与日志聚合使用；包装器的文本形象沿用委托的 `label`，
///   这样监控工具看到的始终是原任务的身份；
/// - 委托体 panic 会沿执行线程展开，本形态不提供结果通道。
pub struct RunnableTask {
    label: Cow<'static, str>,
    run: Box<dyn FnOnce() + Send + 'static>,
}

impl RunnableTask {
    /// 以默认标签构造任务。
    pub fn new(run: impl FnOnce() + Send + 'static) -> Self {
        Self::named("runnable", run)
    }

    /// 以给定标签构造任务。
    pub fn named(label: impl Into<Cow<'static, str>>, run: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }

    /// 读取标签。
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_cow(&self) -> Cow<'static, str> {
        self.label.clone()
    }

    /// 消费并运行任务。
    pub fn run(self) {
        (self.run)();
    }
}

impl fmt::Display for RunnableTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl fmt::Debug for RunnableTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunnableTask({})", self.label)
    }
}

/// 一次性、带返回值的任务形态。
pub struct CallableTask<T> {
    label: Cow<'static, str>,
    call: Box<dyn FnOnce() -> TaskResult<T> + Send + 'static>,
}

impl<T> CallableTask<T> {
    /// 以默认标签构造任务。
    pub fn new(call: impl FnOnce() -> TaskResult<T> + Send + 'static) -> Self {
        Self::named("callable", call)
    }

    /// 以给定标签构造任务。
    pub fn named(
        label: impl Into<Cow<'static, str>>,
        call: impl FnOnce() -> TaskResult<T> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            call: Box::new(call),
        }
    }

    /// 读取标签。
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_cow(&self) -> Cow<'static, str> {
        self.label.clone()
    }

    /// 消费并运行任务。
    pub fn call(self) -> TaskResult<T> {
        (self.call)()
    }
}

impl<T> fmt::Display for CallableTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<T> fmt::Debug for CallableTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallableTask({})", self.label)
    }
}

/// 可反复触发的周期任务形态。
///
/// # 契约说明（What）
/// - 调度器对同一个实例逐 tick 复用，因此委托体是 `Fn` 而非 `FnOnce`；
/// - 周期包装的快照在调度时刻一次固化，之后的 tick 不再刷新（frozen-schedule 语义）。
pub struct PeriodicTask {
    label: Cow<'static, str>,
    run: Box<dyn Fn() + Send + Sync + 'static>,
}

impl PeriodicTask {
    /// 以默认标签构造任务。
    pub fn new(run: impl Fn() + Send + Sync + 'static) -> Self {
        Self::named("periodic", run)
    }

    /// 以给定标签构造任务。
    pub fn named(
        label: impl Into<Cow<'static, str>>,
        run: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }

    /// 读取标签。
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_cow(&self) -> Cow<'static, str> {
        self.label.clone()
    }

    /// 触发一次 tick。
    pub fn run(&self) {
        (self.run)();
    }
}

impl fmt::Display for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeriodicTask({})", self.label)
    }
}

/// 展开路径上的恢复守卫。
///
/// 正常路径会先解除武装再做显式恢复（以便把存储拒绝上抛）；只有委托体 panic
/// 时才由 `Drop` 兜底，此时存储拒绝没有结果通道，只能记录事件后继续展开。
struct RestoreFrame<'a> {
    store: &'a dyn ContextStore,
    original: Option<AmbientContext>,
    inheritable: bool,
    armed: bool,
}

impl RestoreFrame<'_> {
    fn restore(
        store: &dyn ContextStore,
        original: Option<AmbientContext>,
        inheritable: bool,
    ) -> Result<(), crate::error::StoreError> {
        match original {
            Some(ctx) => store.install(ctx, inheritable),
            None => store.clear(),
        }
    }
}

impl Drop for RestoreFrame<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let original = self.original.take();
        if let Err(err) = Self::restore(self.store, original, self.inheritable) {
            tracing::error!(
                target: "spark_ambient::task",
                error = %err,
                "context restore failed on unwind path",
            );
        }
    }
}

/// 协议的通用原语：在给定快照下运行一段委托体。
///
/// # 契约说明（What）
/// - **前置条件**：`store` 即执行线程将要读写的存储，`snapshot` 构造后未被改动；
/// - **后置条件**：返回时执行线程的上下文与进入时一致；嵌套调用时恢复到的是
///   外层快照，LIFO 自然成立，因为 `original` 读到的就是外层刚安装的值。
pub(crate) fn run_with_context<T>(
    store: &dyn ContextStore,
    snapshot: &ContextSnapshot,
    label: &str,
    body: impl FnOnce() -> TaskResult<T>,
) -> TaskResult<T> {
    let original = store.current();
    let installed = match snapshot.context() {
        Some(ctx) => store.install(ctx.clone(), snapshot.is_inheritable()),
        None => store.clear(),
    };
    if let Err(err) = installed {
        return Err(TaskError::install_failed(err));
    }
    tracing::trace!(target: "spark_ambient::task", task = label, "context installed");

    let mut frame = RestoreFrame {
        store,
        original,
        inheritable: snapshot.is_inheritable(),
        armed: true,
    };
    let outcome = body();
    frame.armed = false;
    let original = frame.original.take();
    drop(frame);

    let restored = RestoreFrame::restore(store, original, snapshot.is_inheritable());
    tracing::trace!(target: "spark_ambient::task", task = label, "context restored");
    match (outcome, restored) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(err)) => Err(TaskError::restore_failed(err)),
        (Err(primary), Err(err)) => Err(primary.with_suppressed_restore(err)),
    }
}

/// 给 [`RunnableTask`] 加上捕获纪律的包装。
///
/// # 设计背景（Why）
/// - 两种构造模式对应调用方的两种诉求：[`with_snapshot`](Self::with_snapshot)
///   显式钉住某个上下文；[`capture`](Self::capture) 捕获"此刻的环境值"——
///   哪怕包装很久之后才运行，任务看到的仍是包装时刻的值。
///
/// # 风险提示（Trade-offs）
/// - 捕获模式在包装与提交相隔很远时容易捕到意料之外的值，这是刻意行为，
///   调用方需自行权衡。
pub struct ContextRunnable {
    delegate: RunnableTask,
    snapshot: ContextSnapshot,
    store: Arc<dyn ContextStore>,
}

impl ContextRunnable {
    /// 在构造时刻捕获 `store.current()` 作为快照。
    pub fn capture(delegate: RunnableTask, store: Arc<dyn ContextStore>, inheritable: bool) -> Self {
        let snapshot = ContextSnapshot::new(store.current(), inheritable);
        Self::with_snapshot(delegate, snapshot, store)
    }

    /// 以显式快照构造。
    pub fn with_snapshot(
        delegate: RunnableTask,
        snapshot: ContextSnapshot,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        Self {
            delegate,
            snapshot,
            store,
        }
    }

    /// 读取固化的快照。
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// 按协议运行委托体。
    pub fn run(self) -> TaskResult<()> {
        let Self {
            delegate,
            snapshot,
            store,
        } = self;
        let label = delegate.label_cow();
        run_with_context(store.as_ref(), &snapshot, label.as_ref(), move || {
            delegate.run();
            Ok(())
        })
    }

    /// 擦除回执行面接受的普通形态，标签保持委托体的身份。
    ///
    /// 该形态没有结果通道：安装或恢复被宿主存储拒绝时在执行线程上 panic，
    /// 等价于清理失败沿池线程上抛。
    pub fn into_task(self) -> RunnableTask {
        let label = self.delegate.label_cow();
        RunnableTask::named(label, move || {
            if let Err(err) = self.run() {
                panic!("ambient context propagation failed on fire-and-forget task: {err}");
            }
        })
    }
}

impl fmt::Display for ContextRunnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.delegate.label())
    }
}

impl fmt::Debug for ContextRunnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextRunnable({})", self.delegate.label())
    }
}

/// 给 [`CallableTask`] 加上捕获纪律的包装。
pub struct ContextCallable<T> {
    delegate: CallableTask<T>,
    snapshot: ContextSnapshot,
    store: Arc<dyn ContextStore>,
}

impl<T: Send + 'static> ContextCallable<T> {
    /// 在构造时刻捕获 `store.current()` 作为快照。
    pub fn capture(
        delegate: CallableTask<T>,
        store: Arc<dyn ContextStore>,
        inheritable: bool,
    ) -> Self {
        let snapshot = ContextSnapshot::new(store.current(), inheritable);
        Self::with_snapshot(delegate, snapshot, store)
    }

    /// 以显式快照构造。
    pub fn with_snapshot(
        delegate: CallableTask<T>,
        snapshot: ContextSnapshot,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        Self {
            delegate,
            snapshot,
            store,
        }
    }

    /// 读取固化的快照。
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// 按协议运行委托体并返回其结果。
    pub fn call(self) -> TaskResult<T> {
        let Self {
            delegate,
            snapshot,
            store,
        } = self;
        let label = delegate.label_cow();
        run_with_context(store.as_ref(), &snapshot, label.as_ref(), move || delegate.call())
    }

    /// 擦除回执行面接受的普通形态，标签保持委托体的身份。
    pub fn into_task(self) -> CallableTask<T> {
        let label = self.delegate.label_cow();
        CallableTask::named(label, move || self.call())
    }
}

impl<T> fmt::Display for ContextCallable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.delegate.label())
    }
}

impl<T> fmt::Debug for ContextCallable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextCallable({})", self.delegate.label())
    }
}

/// 给 [`PeriodicTask`] 加上捕获纪律的包装。
///
/// # 契约说明（What）
/// - 一次包装、多次 tick：快照在构造（即调度）时刻固化，之后的每个 tick
///   观察到的都是调度时的环境值，而非触发时刻的值。这是刻意契约。
pub struct PeriodicContextTask {
    delegate: PeriodicTask,
    snapshot: ContextSnapshot,
    store: Arc<dyn ContextStore>,
}

impl PeriodicContextTask {
    /// 在构造时刻捕获 `store.current()` 作为快照。
    pub fn capture(delegate: PeriodicTask, store: Arc<dyn ContextStore>, inheritable: bool) -> Self {
        let snapshot = ContextSnapshot::new(store.current(), inheritable);
        Self::with_snapshot(delegate, snapshot, store)
    }

    /// 以显式快照构造。
    pub fn with_snapshot(
        delegate: PeriodicTask,
        snapshot: ContextSnapshot,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        Self {
            delegate,
            snapshot,
            store,
        }
    }

    /// 读取固化的快照。
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// 按协议触发一次 tick。
    pub fn tick(&self) {
        let outcome = run_with_context(
            self.store.as_ref(),
            &self.snapshot,
            self.delegate.label(),
            || {
                self.delegate.run();
                Ok(())
            },
        );
        if let Err(err) = outcome {
            panic!("ambient context propagation failed on periodic tick: {err}");
        }
    }

    /// 擦除回执行面接受的普通形态，标签保持委托体的身份。
    pub fn into_task(self) -> PeriodicTask {
        let label = self.delegate.label_cow();
        PeriodicTask::named(label, move || self.tick())
    }
}

impl fmt::Display for PeriodicContextTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.delegate.label())
    }
}

impl fmt::Debug for PeriodicContextTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeriodicContextTask({})", self.delegate.label())
    }
}
