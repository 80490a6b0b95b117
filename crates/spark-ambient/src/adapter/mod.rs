//! # adapter 模块说明
//!
//! ## 角色定位（Why）
//! - 对每一级执行面契约提供一个"先包装、再转发"的装饰器：任务在提交时刻被
//!   捕获包装（见 [`crate::task`]），随后原样交给底层执行面；
//! - 这类装饰器家族容易沿"普通执行器 → 任务服务 → 调度服务"的继承链乘以
//!   可继承/不可继承两套子类展开出八个类型；此处收敛为四个按能力选择的适配器，外加一个
//!   [`PropagationPolicy`] 配置值承载上下文来源与继承开关。
//!
//! ## 契约说明（What）
//! - 适配器自身实现它所装饰的执行面契约，因此可以彼此叠放，也可以被调用方
//!   当作普通执行面继续传递；
//! - 除底层执行面引用与构造时固化的策略外，适配器不持有任何可变状态。

mod executor;
mod scheduled;
mod service;
mod start_timeout;

pub use executor::PropagatingExecutor;
pub use scheduled::PropagatingScheduler;
pub use service::PropagatingTaskService;
pub use start_timeout::PropagatingStartTimeoutExecutor;

use std::sync::Arc;

use crate::context::{AmbientContext, ContextSnapshot};
use crate::store::ContextStore;
use crate::task::{
    CallableTask, ContextCallable, ContextRunnable, PeriodicContextTask, PeriodicTask,
    RunnableTask,
};

/// 适配器的传播策略：上下文来源 + 继承开关。
///
/// # 设计背景（Why）
/// - 调用方有两种诉求：钉住一个显式上下文（[`pinned`](Self::pinned)），或在每次
///   包装时捕获"此刻的环境值"（[`capture_at_wrap`](Self::capture_at_wrap)）。
///   可继承形态在这里只是 [`inheritable`](Self::inheritable) 一个开关，不是独立类型。
///
/// # 契约说明（What）
/// - 策略构造后不可变，适配器整个生命周期使用同一份；
/// - 捕获模式下，快照在**包装时刻**（即提交/调度时刻）固化，而非运行时刻。
#[derive(Clone, Debug, Default)]
pub struct PropagationPolicy {
    context: Option<AmbientContext>,
    inheritable: bool,
}

impl PropagationPolicy {
    /// 每次包装时捕获当前环境值。
    pub fn capture_at_wrap() -> Self {
        Self::default()
    }

    /// 钉住显式上下文，所有包装共用。
    pub fn pinned(context: AmbientContext) -> Self {
        Self {
            context: Some(context),
            inheritable: false,
        }
    }

    /// 打开继承开关：安装时同时走存储的继承通道。
    pub fn inheritable(mut self) -> Self {
        self.inheritable = true;
        self
    }

    /// 读取钉住的上下文（捕获模式下为 `None`）。
    pub fn context(&self) -> Option<&AmbientContext> {
        self.context.as_ref()
    }

    /// 继承开关是否打开。
    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }

    pub(crate) fn wrap_runnable(
        &self,
        store: &Arc<dyn ContextStore>,
        task: RunnableTask,
    ) -> RunnableTask {
        match &self.context {
            Some(ctx) => ContextRunnable::with_snapshot(
                task,
                ContextSnapshot::new(Some(ctx.clone()), self.inheritable),
                store.clone(),
            ),
            None => ContextRunnable::capture(task, store.clone(), self.inheritable),
        }
        .into_task()
    }

    pub(crate) fn wrap_callable<T: Send + 'static>(
        &self,
        store: &Arc<dyn ContextStore>,
        task: CallableTask<T>,
    ) -> CallableTask<T> {
        match &self.context {
            Some(ctx) => ContextCallable::with_snapshot(
                task,
                ContextSnapshot::new(Some(ctx.clone()), self.inheritable),
                store.clone(),
            ),
            None => ContextCallable::capture(task, store.clone(), self.inheritable),
        }
        .into_task()
    }

    pub(crate) fn wrap_periodic(
        &self,
        store: &Arc<dyn ContextStore>,
        task: PeriodicTask,
    ) -> PeriodicTask {
        match &self.context {
            Some(ctx) => PeriodicContextTask::with_snapshot(
                task,
                ContextSnapshot::new(Some(ctx.clone()), self.inheritable),
                store.clone(),
            ),
            None => PeriodicContextTask::capture(task, store.clone(), self.inheritable),
        }
        .into_task()
    }
}
