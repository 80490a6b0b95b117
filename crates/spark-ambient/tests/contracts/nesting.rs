//! 同线程嵌套：内层包装调用返回后恢复到外层快照（LIFO），
//! 外层返回后才回到调用前的值。

#[path = "../support/mod.rs"]
mod support;

use std::sync::{Arc, Mutex};

use spark_ambient::{
    AmbientContext, ContextRunnable, ContextSnapshot, ContextStore, RunnableTask,
    ThreadContextStore,
};

fn current_text(store: &dyn ContextStore) -> Option<String> {
    store
        .current()
        .and_then(|ctx| ctx.downcast_ref::<String>().cloned())
}

#[test]
fn nested_wrappers_unwind_in_lifo_order() {
    let store: Arc<dyn ContextStore> = Arc::new(ThreadContextStore::new());
    store
        .install(AmbientContext::new("caller".to_string()), false)
        .expect("default store never rejects");

    // (进入内层前, 内层运行中, 内层返回后) 三个观测点。
    let trace: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));

    let outer_trace = trace.clone();
    let outer_store = store.clone();
    let outer = ContextRunnable::with_snapshot(
        RunnableTask::named("outer", move || {
            outer_trace
                .lock()
                .unwrap()
                .push(current_text(outer_store.as_ref()));

            let inner_trace = outer_trace.clone();
            let inner_store = outer_store.clone();
            let inner = ContextRunnable::with_snapshot(
                RunnableTask::named("inner", move || {
                    inner_trace
                        .lock()
                        .unwrap()
                        .push(current_text(inner_store.as_ref()));
                }),
                ContextSnapshot::new(Some(AmbientContext::new("inner".to_string())), false),
                outer_store.clone(),
            );
            inner.run().expect("default store never rejects");

            outer_trace
                .lock()
                .unwrap()
                .push(current_text(outer_store.as_ref()));
        }),
        ContextSnapshot::new(Some(AmbientContext::new("outer".to_string())), false),
        store.clone(),
    );
    outer.run().expect("default store never rejects");

    let trace = trace.lock().unwrap();
    assert_eq!(
        trace.as_slice(),
        &[
            Some("outer".to_string()),
            Some("inner".to_string()),
            Some("outer".to_string()),
        ],
        "内层返回必须恢复到外层快照，而非调用前的值"
    );
    assert_eq!(
        current_text(store.as_ref()).as_deref(),
        Some("caller"),
        "外层返回后才回到调用前的值"
    );
    store.clear().expect("default store never rejects");
}

#[test]
fn nested_empty_snapshot_restores_outer_value() {
    let store: Arc<dyn ContextStore> = Arc::new(ThreadContextStore::new());

    let seen_after_inner = Arc::new(Mutex::new(None));
    let probe = seen_after_inner.clone();
    let outer_store = store.clone();
    let outer = ContextRunnable::with_snapshot(
        RunnableTask::named("outer", move || {
            let inner = ContextRunnable::with_snapshot(
                RunnableTask::named("inner", || {}),
                ContextSnapshot::new(None, false),
                outer_store.clone(),
            );
            inner.run().expect("default store never rejects");
            *probe.lock().unwrap() = current_text(outer_store.as_ref());
        }),
        ContextSnapshot::new(Some(AmbientContext::new("outer".to_string())), false),
        store.clone(),
    );
    outer.run().expect("default store never rejects");

    assert_eq!(
        seen_after_inner.lock().unwrap().as_deref(),
        Some("outer"),
        "内层清空后仍需恢复外层快照"
    );
    assert!(current_text(store.as_ref()).is_none());
}
