//! 失败路径契约：委托失败原样穿透；panic 展开仍恢复；存储拒绝
//! 按"安装失败 / 恢复失败 / 被抑制附注"三种形态上抛。

#[path = "../support/mod.rs"]
mod support;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use spark_ambient::{
    AmbientContext, CallableTask, ContextCallable, ContextRunnable, ContextSnapshot, ContextStore,
    RunnableTask, StoreError, TaskError, TaskErrorKind,
};
use support::FailingStore;

fn snapshot_of(text: &str) -> ContextSnapshot {
    ContextSnapshot::new(Some(AmbientContext::new(text.to_string())), false)
}

#[test]
fn delegate_error_passes_through_unmodified() {
    let store = FailingStore::new();
    let wrapped = ContextCallable::with_snapshot(
        CallableTask::<u32>::named("billing", || Err(TaskError::failed("ledger offline"))),
        snapshot_of("req-1"),
        store,
    );
    let err = wrapped.call().expect_err("delegate reported failure");
    assert_eq!(err.kind(), &TaskErrorKind::Failed("ledger offline".into()));
    assert!(err.suppressed_restore().is_none(), "本层不得加工委托失败");
}

#[test]
fn panic_unwind_still_restores_prior_value() {
    let store = FailingStore::new();
    let handle: Arc<dyn ContextStore> = store.clone();
    handle
        .install(AmbientContext::new("prior".to_string()), false)
        .expect("store accepts writes");

    let wrapped = ContextRunnable::with_snapshot(
        RunnableTask::new(|| panic!("delegate exploded")),
        snapshot_of("task"),
        handle.clone(),
    );
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| wrapped.run()));
    assert!(outcome.is_err(), "panic 必须沿执行线程继续展开");

    assert_eq!(
        handle
            .current()
            .and_then(|ctx| ctx.downcast_ref::<String>().cloned())
            .as_deref(),
        Some("prior"),
        "展开路径由守卫兜底恢复"
    );
    handle.clear().expect("store accepts writes");
}

#[test]
fn rejected_install_skips_delegate_entirely() {
    let store = FailingStore::new();
    store.reject_install(true);

    let ran = Arc::new(Mutex::new(false));
    let probe = ran.clone();
    let wrapped = ContextCallable::with_snapshot(
        CallableTask::<()>::new(move || {
            *probe.lock().unwrap() = true;
            Ok(())
        }),
        snapshot_of("task"),
        store.clone(),
    );
    let err = wrapped.call().expect_err("install was rejected");
    assert_eq!(
        err.kind(),
        &TaskErrorKind::ContextInstall(StoreError::install_rejected("store sealed for install"))
    );
    assert!(!*ran.lock().unwrap(), "安装失败时委托体不得开始");
}

#[test]
fn successful_delegate_with_rejected_restore_reports_restore_failure() {
    let store = FailingStore::new();

    // 进入时槽位为空，恢复走 clear；在委托体内封住 clear。
    let toggle = store.clone();
    let wrapped = ContextCallable::with_snapshot(
        CallableTask::<u32>::new(move || {
            toggle.reject_clear(true);
            Ok(7)
        }),
        snapshot_of("task"),
        store.clone(),
    );
    let err = wrapped.call().expect_err("restore was rejected");
    assert_eq!(
        err.kind(),
        &TaskErrorKind::ContextRestore(StoreError::clear_rejected("store sealed for clear"))
    );
    assert!(err.suppressed_restore().is_none());

    store.reject_clear(false);
    let handle: Arc<dyn ContextStore> = store;
    handle.clear().expect("store accepts writes again");
}

#[test]
fn failed_delegate_keeps_primary_and_attaches_suppressed_restore() {
    let store = FailingStore::new();

    let toggle = store.clone();
    let wrapped = ContextCallable::with_snapshot(
        CallableTask::<()>::new(move || {
            toggle.reject_clear(true);
            Err(TaskError::failed("ledger offline"))
        }),
        snapshot_of("task"),
        store.clone(),
    );
    let err = wrapped.call().expect_err("delegate reported failure");
    assert_eq!(
        err.kind(),
        &TaskErrorKind::Failed("ledger offline".into()),
        "委托失败保持为主失败"
    );
    assert_eq!(
        err.suppressed_restore(),
        Some(&StoreError::clear_rejected("store sealed for clear")),
        "恢复失败以附注形式携带"
    );

    store.reject_clear(false);
    let handle: Arc<dyn ContextStore> = store;
    handle.clear().expect("store accepts writes again");
}

#[test]
fn fire_and_forget_wrapper_panics_on_propagation_failure() {
    let store = FailingStore::new();
    store.reject_install(true);

    let task = ContextRunnable::with_snapshot(
        RunnableTask::named("flush", || {}),
        snapshot_of("task"),
        store,
    )
    .into_task();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
    assert!(
        outcome.is_err(),
        "无结果通道的形态在执行线程上以 panic 暴露传播失败"
    );
}
