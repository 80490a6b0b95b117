//! # surface 模块说明
//!
//! ## 角色定位（Why）
//! - 按能力集把外部执行面拆成四级契约：裸提交（[`ExecuteSurface`]）、
//!   带 future 的任务服务（[`TaskServiceSurface`]）、延迟/周期调度
//!   （[`ScheduledTaskSurface`]）、限时起步提交（[`StartTimeoutSurface`]）。
//!   适配器按需选择其中一级做装饰，而不是逐能力叠一层继承。
//! - 本 crate 不提供任何执行面实现：线程池、调度器、排队策略全部由宿主注入，
//!   这里只约定提交形态与控制面句柄。
//!
//! ## 契约说明（What）
//! - 任务一经提交即归执行面所有；执行面在哪个线程、何时运行任务均不受本层约束；
//! - 生命周期操作只触碰池状态，不得包装、检视或运行用户任务。

use std::time::Duration;

use crate::error::TaskResult;
use crate::task::{CallableTask, PeriodicTask, RunnableTask};

/// 值返回型提交的控制面句柄。
///
/// # 契约说明（What）
/// - `cancel` 首次生效返回 `true`；任务尚未开始时取消意味着它永远不会运行，
///   包装器的安装/恢复也就不会发生（零副作用）；
/// - `join` / `join_timeout` 消费句柄并交出最终结果；超时以
///   [`TaskErrorKind::Timeout`](crate::error::TaskErrorKind::Timeout) 表达；
/// - 实现者需保证 `is_finished` 为真后结果立即可取。
pub trait TaskFuture<T>: Send {
    /// 请求取消，返回是否首次生效。
    fn cancel(&self) -> bool;

    /// 任务是否已经结束（含取消与失败）。
    fn is_finished(&self) -> bool;

    /// 任务是否已被取消。
    fn is_cancelled(&self) -> bool;

    /// 阻塞等待结果。
    fn join(self: Box<Self>) -> TaskResult<T>;

    /// 限时等待结果。
    fn join_timeout(self: Box<Self>, timeout: Duration) -> TaskResult<T>;
}

/// 周期提交的控制面句柄。
pub trait PeriodicHandle: Send + Sync {
    /// 停止后续 tick，返回是否首次生效。
    fn cancel(&self) -> bool;

    /// 周期任务是否已被取消。
    fn is_cancelled(&self) -> bool;
}

/// 裸提交执行面：发后不理。
pub trait ExecuteSurface: Send + Sync {
    /// 提交任务；无结果、无失败转译。
    fn execute(&self, task: RunnableTask);
}

/// 带 future 语义的任务服务执行面。
///
/// # 契约说明（What）
/// - `invoke_all`：按输入顺序返回各任务的句柄；空集合原样穿透，不产生任何提交；
/// - `invoke_any`：返回最先成功完成的任务结果；全部失败或超时以对应错误上抛；
/// - 生命周期五操作直接暴露池状态；`shutdown_now` 交还尚未开始的任务。
pub trait TaskServiceSurface: ExecuteSurface {
    /// 提交值返回型任务。
    fn submit<T: Send + 'static>(&self, task: CallableTask<T>) -> Box<dyn TaskFuture<T>>;

    /// 批量提交，顺序与输入一致。
    fn invoke_all<T: Send + 'static>(
        &self,
        tasks: Vec<CallableTask<T>>,
        timeout: Option<Duration>,
    ) -> Vec<Box<dyn TaskFuture<T>>>;

    /// 竞速提交，返回最先成功者的结果。
    fn invoke_any<T: Send + 'static>(
        &self,
        tasks: Vec<CallableTask<T>>,
        timeout: Option<Duration>,
    ) -> TaskResult<T>;

    /// 停止接受新任务，已排队任务继续执行。
    fn shutdown(&self);

    /// 停止接受新任务并交还尚未开始的任务。
    fn shutdown_now(&self) -> Vec<RunnableTask>;

    /// 是否已进入关闭流程。
    fn is_shutdown(&self) -> bool;

    /// 是否所有任务均已结束。
    fn is_terminated(&self) -> bool;

    /// 限时等待全部任务结束，返回是否在期限内终止。
    fn await_termination(&self, timeout: Duration) -> bool;
}

/// 支持延迟与周期调度的执行面。
///
/// # 契约说明（What）
/// - 周期操作接受可复用的 [`PeriodicTask`]：调度器逐 tick 调用同一实例；
/// - 实现者应拒绝零周期的固定频率/固定间隔提交（参数校验属于执行面义务）。
pub trait ScheduledTaskSurface: TaskServiceSurface {
    /// 延迟一次性提交。
    fn schedule(&self, task: RunnableTask, delay: Duration) -> Box<dyn TaskFuture<()>>;

    /// 延迟值返回型提交。
    fn schedule_callable<T: Send + 'static>(
        &self,
        task: CallableTask<T>,
        delay: Duration,
    ) -> Box<dyn TaskFuture<T>>;

    /// 固定频率周期提交。
    fn schedule_at_fixed_rate(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Box<dyn PeriodicHandle>;

    /// 固定间隔周期提交。
    fn schedule_with_fixed_delay(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        delay: Duration,
    ) -> Box<dyn PeriodicHandle>;
}

/// 限时起步执行面。
pub trait StartTimeoutSurface: ExecuteSurface {
    /// 提交任务，`start_timeout` 约束执行面等待开跑的时长；
    /// 它只影响起步等待，与安装/恢复行为无关。
    fn execute_within(&self, task: RunnableTask, start_timeout: Duration);
}
