use std::sync::Arc;
use std::time::Duration;

use super::PropagationPolicy;
use crate::store::{ContextStore, ThreadContextStore};
use crate::surface::{ExecuteSurface, StartTimeoutSurface};
use crate::task::RunnableTask;

/// 限时起步执行面的传播装饰器。
///
/// # 契约说明（What）
/// - `execute_within` 包装一次后连同原始超时值转发；超时只约束底层执行面
///   等待任务开跑的时长，与安装/恢复行为无关。
pub struct PropagatingStartTimeoutExecutor<S> {
    surface: S,
    policy: PropagationPolicy,
    store: Arc<dyn ContextStore>,
}

impl<S: StartTimeoutSurface> PropagatingStartTimeoutExecutor<S> {
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

impl<S: StartTimeoutSurface> ExecuteSurface for PropagatingStartTimeoutExecutor<S> {
    fn execute(&self, task: RunnableTask) {
        self.surface
            .execute(self.policy.wrap_runnable(&self.store, task));
    }
}

impl<S: StartTimeoutSurface> StartTimeoutSurface for PropagatingStartTimeoutExecutor<S> {
    fn execute_within(&self, task: RunnableTask, start_timeout: Duration) {
        self.surface
            .execute_within(self.policy.wrap_runnable(&self.store, task), start_timeout);
    }
}
