//! # store 模块说明
//!
//! ## 角色定位（Why）
//! - [`ContextStore`] 是传播协议消费的宿主能力：当前线程上下文的读、写、清三元组。
//!   宿主框架里它往往是全局 Holder；此处建模为显式注入的协作者，便于替换与测试。
//! - [`ThreadContextStore`] 是默认实现：惰性创建的线程本地槽位，外加一条模拟
//!   "可继承 Holder"的进程内继承通道。
//!
//! ## 并发模型（How）
//! - 线程本地槽位只会被其所属线程读写，天然无竞争，不需要锁；
//! - 继承通道是跨线程共享的，用读写锁保护；协议纪律保证它只在包装调用
//!   的安装/恢复步骤中被改写。

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::context::AmbientContext;
use crate::error::StoreError;

/// 宿主环境提供的上下文存取能力。
///
/// # 契约说明（What）
/// - `current()`：返回调用线程当前可见的上下文；槽位尚未创建等价于"无"；
/// - `install(ctx, inheritable)`：设为调用线程的当前值；`inheritable` 为真时
///   同时使它对协议之外派生的线程默认可见；
/// - `clear()`：移除调用线程可见的值；
/// - `install` / `clear` 可失败——注入的宿主访问器有权拒绝写入，恢复路径的
///   合并语义依赖这一点（见 [`crate::task`]）。
///
/// # 风险提示（Trade-offs）
/// - 本 Trait 不规定跨线程同步策略：不同线程各自的 get/set 互不干扰是实现义务，
///   调用方不应依赖跨线程可见顺序。
pub trait ContextStore: Send + Sync {
    /// 读取调用线程的当前上下文。
    fn current(&self) -> Option<AmbientContext>;

    /// 将上下文安装为调用线程的当前值。
    fn install(&self, context: AmbientContext, inheritable: bool) -> Result<(), StoreError>;

    /// 清空调用线程可见的上下文。
    fn clear(&self) -> Result<(), StoreError>;
}

thread_local! {
    // 每线程槽位，首次访问时惰性创建；进程退出时随线程销毁，无需显式回收。
    static LOCAL_SLOT: RefCell<Option<AmbientContext>> = const { RefCell::new(None) };
}

/// 默认存储：线程本地槽位 + 继承通道。
///
/// # 设计背景（Why）
/// - 可继承语义需要两个槽位：普通槽与可继承槽，后者让派生线程在创建时拿到
///   父线程的值。Rust 无法挂钩线程创建，因此继承通道退化为本实例共享的
///   回退槽：线程本地槽为空时，`current()` 读它。
///
/// # 契约说明（What）
/// - 克隆共享同一条继承通道；[`global()`](Self::global) 返回进程级共享实例，
///   对应"全局 Holder"的常见用法；
/// - `install(.., true)` 发布到继承通道并清掉本线程槽位（设入可继承槽时
///   普通槽被移除）；
/// - `clear()` 同时清空本线程槽位与继承通道。
///
/// # 风险提示（Trade-offs）
/// - 继承通道是"之后创建的所有读者可见"，比"仅派生子线程可见"更宽；
///   需要严格父子继承语义的宿主应注入自己的 [`ContextStore`] 实现。
#[derive(Clone, Default)]
pub struct ThreadContextStore {
    inheritable: Arc<RwLock<Option<AmbientContext>>>,
}

static GLOBAL_STORE: OnceLock<ThreadContextStore> = OnceLock::new();

impl ThreadContextStore {
    /// 创建继承通道独立的新实例。
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回进程级共享实例。
    pub fn global() -> Self {
        GLOBAL_STORE.get_or_init(Self::default).clone()
    }

    /// 以共享句柄形式返回进程级实例，便于直接注入适配器。
    pub fn global_handle() -> Arc<dyn ContextStore> {
        Arc::new(Self::global())
    }
}

impl ContextStore for ThreadContextStore {
    fn current(&self) -> Option<AmbientContext> {
        let local = LOCAL_SLOT.with(|slot| slot.borrow().clone());
        local.or_else(|| self.inheritable.read().clone())
    }

    fn install(&self, context: AmbientContext, inheritable: bool) -> Result<(), StoreError> {
        if inheritable {
            *self.inheritable.write() = Some(context);
            LOCAL_SLOT.with(|slot| slot.borrow_mut().take());
        } else {
            LOCAL_SLOT.with(|slot| *slot.borrow_mut() = Some(context));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        LOCAL_SLOT.with(|slot| slot.borrow_mut().take());
        *self.inheritable.write() = None;
        Ok(())
    }
}

impl fmt::Debug for ThreadContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ThreadContextStore")
    }
}
