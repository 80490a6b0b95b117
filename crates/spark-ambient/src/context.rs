//! # context 模块说明
//!
//! ## 角色定位（Why）
//! - 定义传播协议操作的两个基础值：不透明的环境上下文句柄 [`AmbientContext`]，
//!   以及在包装时刻固化的 [`ContextSnapshot`]；
//! - 协议自身从不解读上下文的内容或相等性，宿主放入什么、任务就看到什么。
//!
//! ## 契约说明（What）
//! - `AmbientContext` 克隆为常数成本（内部 `Arc`），可安全跨线程传递；
//! - `ContextSnapshot` 构造后不可变，并发修改源上下文不会影响既有快照。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 不透明的环境上下文句柄。
///
/// # 设计背景（Why）
/// - 宿主框架通常以属性对象承载每请求状态；本层只负责搬运，不关心载荷结构，
///   因此用 `Arc<dyn Any + Send + Sync>` 做类型擦除，宿主通过 [`downcast_ref`](Self::downcast_ref)
///   取回具体类型。
///
/// # 契约说明（What）
/// - **前置条件**：载荷需满足 `Any + Send + Sync`，以便在执行面的任意线程上被读取；
/// - **后置条件**：克隆共享同一载荷；[`ptr_eq`](Self::ptr_eq) 可判定两个句柄是否指向同一份值。
///
/// # 风险提示（Trade-offs）
/// - 不提供值相等语义：协议按"同一份"而非"内容相同"推理，避免对载荷强加 `Eq` 约束。
#[derive(Clone)]
pub struct AmbientContext {
    value: Arc<dyn Any + Send + Sync>,
}

impl AmbientContext {
    /// 以任意载荷构造上下文句柄。
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
        }
    }

    /// 尝试按具体类型读取载荷。
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 判断两个句柄是否共享同一份载荷。
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for AmbientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AmbientContext(..)")
    }
}

/// 包装时刻固化的上下文快照。
///
/// # 设计背景（Why）
/// - 任务可能在包装很久之后才被执行面调度；把"要安装什么"与"是否沿继承通道发布"
///   在构造时刻一次性定格，是恢复配对与 frozen-schedule 语义的前提。
///
/// # 契约说明（What）
/// - `context` 为 `None` 表示捕获到的是"无上下文"，这是合法值：安装它等价于清空槽位；
/// - `inheritable` 决定安装时是否走存储的继承通道（见 [`crate::store::ContextStore::install`]）；
/// - 构造之后没有任何修改入口。
#[derive(Clone, Debug)]
pub struct ContextSnapshot {
    context: Option<AmbientContext>,
    inheritable: bool,
}

impl ContextSnapshot {
    /// 构造快照。
    pub fn new(context: Option<AmbientContext>, inheritable: bool) -> Self {
        Self {
            context,
            inheritable,
        }
    }

    /// 读取捕获的上下文。
    pub fn context(&self) -> Option<&AmbientContext> {
        self.context.as_ref()
    }

    /// 快照是否要求沿继承通道发布。
    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }
}
