//! 限时起步执行面契约：`execute_within` 包装一次后连同原始超时值转发，
//! 超时参数与安装/恢复行为互不干涉。

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use spark_ambient::{
    AmbientContext, ContextStore, ExecuteSurface, PropagatingStartTimeoutExecutor,
    PropagationPolicy, RunnableTask, StartTimeoutSurface, ThreadContextStore,
};
use support::{DeferredStartPool, OutcomeCell};

#[test]
fn execute_within_forwards_the_start_timeout_untouched() {
    let store: Arc<dyn ContextStore> = Arc::new(ThreadContextStore::new());
    let executor = PropagatingStartTimeoutExecutor::with_store(
        DeferredStartPool::new(),
        PropagationPolicy::pinned(AmbientContext::new("op-3".to_string())),
        store.clone(),
    );

    let done = OutcomeCell::<Option<String>>::new();
    let cell = done.clone();
    let probe_store = store.clone();
    executor.execute_within(
        RunnableTask::named("flush-cache", move || {
            cell.complete(Ok(probe_store
                .current()
                .and_then(|ctx| ctx.downcast_ref::<String>().cloned())));
        }),
        Duration::from_millis(750),
    );

    assert!(done.wait(Some(Duration::from_secs(2))), "任务应在期限内完成");
    assert_eq!(
        done.take().expect("probe recorded a value").as_deref(),
        Some("op-3"),
        "限时提交同样要传播上下文"
    );
    assert_eq!(
        executor.surface().recorded(),
        vec![("flush-cache".to_string(), Duration::from_millis(750))],
        "标签与超时值都必须原样到达底层执行面"
    );
}

#[test]
fn plain_execute_wraps_without_recording_a_timeout() {
    let store: Arc<dyn ContextStore> = Arc::new(ThreadContextStore::new());
    let executor = PropagatingStartTimeoutExecutor::with_store(
        DeferredStartPool::new(),
        PropagationPolicy::pinned(AmbientContext::new("op-4".to_string())),
        store.clone(),
    );

    let done = OutcomeCell::<Option<String>>::new();
    let cell = done.clone();
    let probe_store = store.clone();
    executor.execute(RunnableTask::named("audit", move || {
        cell.complete(Ok(probe_store
            .current()
            .and_then(|ctx| ctx.downcast_ref::<String>().cloned())));
    }));

    assert!(done.wait(Some(Duration::from_secs(2))), "任务应在期限内完成");
    assert_eq!(
        done.take().expect("probe recorded a value").as_deref(),
        Some("op-4")
    );
    assert!(
        executor.surface().recorded().is_empty(),
        "普通提交不得经过限时通道"
    );
}
