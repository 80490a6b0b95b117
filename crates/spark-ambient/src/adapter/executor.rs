use std::sync::Arc;

use super::PropagationPolicy;
use crate::store::{ContextStore, ThreadContextStore};
use crate::surface::ExecuteSurface;
use crate::task::RunnableTask;

/// 裸提交执行面的传播装饰器。
///
/// # 契约说明（What）
/// - `execute` 把任务交给 [`PropagationPolicy`] 包装后原样转发；
///   无结果、无失败转译，重试与排队策略完全属于底层执行面；
/// - 适配器自身实现 [`ExecuteSurface`]，可继续被当作执行面传递或叠放。
pub struct PropagatingExecutor<S> {
    surface: S,
    policy: PropagationPolicy,
    store: Arc<dyn ContextStore>,
}

impl<S: ExecuteSurface> PropagatingExecutor<S> {
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

impl<S: ExecuteSurface> ExecuteSurface for PropagatingExecutor<S> {
    fn execute(&self, task: RunnableTask) {
        self.surface
            .execute(self.policy.wrap_runnable(&self.store, task));
    }
}
