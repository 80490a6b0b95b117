//! 继承开关契约：打开后安装走存储的继承通道，任务运行期间派生的
//! 线程默认可见；恢复同样按继承方式进行，任务结束后通道干净。

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;
use std::thread;

use spark_ambient::{
    AmbientContext, CallableTask, ContextStore, PropagatingExecutor, PropagatingTaskService,
    PropagationPolicy, TaskServiceSurface, ThreadContextStore,
};
use support::{FixedPool, InlineSurface};

#[test]
fn inheritable_install_is_visible_to_threads_spawned_during_the_task() {
    let store = ThreadContextStore::new();
    let handle: Arc<dyn ContextStore> = Arc::new(store.clone());
    let service = PropagatingTaskService::with_store(
        FixedPool::new(1),
        PropagationPolicy::capture_at_wrap().inheritable(),
        handle.clone(),
    );

    handle
        .install(AmbientContext::new("req-9".to_string()), false)
        .expect("default store never rejects");

    let probe_store = store.clone();
    let seen_in_child = service
        .submit(CallableTask::named("fanout", move || {
            // 任务运行期间派生的线程通过继承通道读到同一个值。
            let child_store = probe_store.clone();
            let seen = thread::spawn(move || {
                child_store
                    .current()
                    .and_then(|ctx| ctx.downcast_ref::<String>().cloned())
            })
            .join()
            .map_err(|_| spark_ambient::TaskError::panicked())?;
            Ok(seen)
        }))
        .join()
        .expect("wrapped task completes");
    assert_eq!(
        seen_in_child.as_deref(),
        Some("req-9"),
        "继承安装必须对任务期间派生的线程可见"
    );

    // 恢复后继承通道回到进入前的状态（空）。
    let after_store = store.clone();
    let seen_after = thread::spawn(move || after_store.current().is_some())
        .join()
        .expect("probe thread");
    assert!(!seen_after, "任务结束后继承通道必须干净");

    handle.clear().expect("default store never rejects");
}

#[test]
fn plain_policy_never_touches_the_inheritable_channel() {
    let store = ThreadContextStore::new();
    let handle: Arc<dyn ContextStore> = Arc::new(store.clone());
    let service = PropagatingTaskService::with_store(
        InlineSurface::new(),
        PropagationPolicy::pinned(AmbientContext::new("req-3".to_string())),
        handle,
    );

    let probe_store = store.clone();
    let seen_in_child = service
        .submit(CallableTask::new(move || {
            let child_store = probe_store.clone();
            thread::spawn(move || child_store.current().is_some())
                .join()
                .map_err(|_| spark_ambient::TaskError::panicked())
        }))
        .join()
        .expect("task completes");
    assert!(!seen_in_child, "非继承安装不得进入继承通道");
}

#[test]
fn inheritable_twin_constructors_only_flip_the_switch() {
    let plain = PropagatingExecutor::new(InlineSurface::new());
    assert!(!plain.policy().is_inheritable());
    assert!(plain.policy().context().is_none());

    let twin = PropagatingExecutor::inheritable(InlineSurface::new());
    assert!(twin.policy().is_inheritable());
    assert!(
        twin.policy().context().is_none(),
        "孪生构造只改变继承开关，不改变上下文来源"
    );
}
