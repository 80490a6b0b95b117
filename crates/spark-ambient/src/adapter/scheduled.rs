use std::sync::Arc;
use std::time::Duration;

use super::PropagationPolicy;
use crate::error::TaskResult;
use crate::store::{ContextStore, ThreadContextStore};
use crate::surface::{
    ExecuteSurface, PeriodicHandle, ScheduledTaskSurface, TaskFuture, TaskServiceSurface,
};
use crate::task::{CallableTask, PeriodicTask, RunnableTask};

/// 调度执行面的传播装饰器。
///
/// # 契约说明（What）
/// - 每次调度恰好包装一次，包装发生在**调度时刻**；
/// - 周期提交复用同一个包装实例：快照在调度时固化，tick 之间不刷新。
///   周期任务永远观察调度发生时的环境值，而非每次触发时的值——这是刻意契约，
///   不是疏漏。
pub struct PropagatingScheduler<S> {
    surface: S,
    policy: PropagationPolicy,
    store: Arc<dyn ContextStore>,
}

impl<S: ScheduledTaskSurface> PropagatingScheduler<S> {
    /// 捕获模式 + 进程级默认存储。
    pub fn new(surface: S) -> Self {
        Self::with_policy(surface, PropagationPolicy::capture_at_wrap())
    }

    /// 捕获模式的可继承孪生。
    pub fn inheritable(surface: S) -> Self {
        Self::with_policy(surface, PropagationPolicy::capture_at_wrap().inheritable())
    }

    /// 显式策略 + 进程级默认存储。
    pub fn with_policy(surface: S, policy: PropagationPolicy) -> Self {
        Self::with_store(surface, policy, ThreadContextStore::global_handle())
    }

    /// 显式策略 + 注入存储。
    pub fn with_store(surface: S, policy: PropagationPolicy, store: Arc<dyn ContextStore>) -> Self {
        Self {
            surface,
            policy,
            store,
        }
    }

    /// 读取底层执行面。
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// 读取传播策略。
    pub fn policy(&self) -> &PropagationPolicy {
        &self.policy
    }
}

impl<S: ScheduledTaskSurface> ExecuteSurface for PropagatingScheduler<S> {
    fn execute(&self, task: RunnableTask) {
        self.surface
            .execute(self.policy.wrap_runnable(&self.store, task));
    }
}

impl<S: ScheduledTaskSurface> TaskServiceSurface for PropagatingScheduler<S> {
    fn submit<T: Send + 'static>(&self, task: CallableTask<T>) -> Box<dyn TaskFuture<T>> {
        self.surface.submit(self.policy.wrap_callable(&self.store, task))
    }

    fn invoke_all<T: Send + 'static>(
        &self,
        tasks: Vec<CallableTask<T>>,
        timeout: Option<Duration>,
    ) -> Vec<Box<dyn TaskFuture<T>>> {
        let wrapped = tasks
            .into_iter()
            .map(|task| self.policy.wrap_callable(&self.store, task))
            .collect();
        self.surface.invoke_all(wrapped, timeout)
    }

    fn invoke_any<T: Send + 'static>(
        &self,
        tasks: Vec<CallableTask<T>>,
        timeout: Option<Duration>,
    ) -> TaskResult<T> {
        let wrapped = tasks
            .into_iter()
            .map(|task| self.policy.wrap_callable(&self.store, task))
            .collect();
        self.surface.invoke_any(wrapped, timeout)
    }

    fn shutdown(&self) {
        self.surface.shutdown();
    }

    fn shutdown_now(&self) -> Vec<RunnableTask> {
        self.surface.shutdown_now()
    }

    fn is_shutdown(&self) -> bool {
        self.surface.is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        self.surface.is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        self.surface.await_termination(timeout)
    }
}

impl<S: ScheduledTaskSurface> ScheduledTaskSurface for PropagatingScheduler<S> {
    fn schedule(&self, task: RunnableTask, delay: Duration) -> Box<dyn TaskFuture<()>> {
        self.surface
            .schedule(self.policy.wrap_runnable(&self.store, task), delay)
    }

    fn schedule_callable<T: Send + 'static>(
        &self,
        task: CallableTask<T>,
        delay: Duration,
    ) -> Box<dyn TaskFuture<T>> {
        self.surface
            .schedule_callable(self.policy.wrap_callable(&self.store, task), delay)
    }

    fn schedule_at_fixed_rate(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Box<dyn PeriodicHandle> {
        self.surface.schedule_at_fixed_rate(
            self.policy.wrap_periodic(&self.store, task),
            initial_delay,
            period,
        )
    }

    fn schedule_with_fixed_delay(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        delay: Duration,
    ) -> Box<dyn PeriodicHandle> {
        self.surface.schedule_with_fixed_delay(
            self.policy.wrap_periodic(&self.store, task),
            initial_delay,
            delay,
        )
    }
}
