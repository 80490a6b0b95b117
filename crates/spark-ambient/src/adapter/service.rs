use std::sync::Arc;
use std::time::Duration;

use super::PropagationPolicy;
use crate::error::TaskResult;
use crate::store::{ContextStore, ThreadContextStore};
use crate::surface::{ExecuteSurface, TaskFuture, TaskServiceSurface};
use crate::task::{CallableTask, RunnableTask};

/// 任务服务执行面的传播装饰器。
///
/// # 契约说明（What）
/// - 每个提交入口先包装、后转发：`submit` 逐个包装，`invoke_all` / `invoke_any`
///   逐元素包装且保持输入顺序，空集合原样穿透；
/// - 生命周期五操作（`shutdown` 等）不触碰用户任务，直接转发、不包装；
/// - [`submit_runnable`](Self::submit_runnable) 与
///   [`submit_with_result`](Self::submit_with_result) 是无返回值提交的
///   便捷形态：先按策略包装任务，再折算为固定结果的 Callable 交给底层。
pub struct PropagatingTaskService<S> {
    surface: S,
    policy: PropagationPolicy,
    store: Arc<dyn ContextStore>,
}

impl<S: TaskServiceSurface> PropagatingTaskService<S> {
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

    /// 提交无返回值任务，取回完成句柄。
    pub fn submit_runnable(&self, task: RunnableTask) -> Box<dyn TaskFuture<()>> {
        self.submit_with_result(task, ())
    }

    /// 提交无返回值任务，完成后交出固定结果。
    pub fn submit_with_result<T: Send + 'static>(
        &self,
        task: RunnableTask,
        result: T,
    ) -> Box<dyn TaskFuture<T>> {
        let wrapped = self.policy.wrap_runnable(&self.store, task);
        let label = wrapped.label_cow();
        self.surface.submit(CallableTask::named(label, move || {
            wrapped.run();
            Ok(result)
        }))
    }
}

impl<S: TaskServiceSurface> ExecuteSurface for PropagatingTaskService<S> {
    fn execute(&self, task: RunnableTask) {
        self.surface
            .execute(self.policy.wrap_runnable(&self.store, task));
    }
}

impl<S: TaskServiceSurface> TaskServiceSurface for PropagatingTaskService<S> {
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
