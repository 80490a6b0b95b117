#![doc = "spark-ambient: 环境上下文（ambient context）捕获、安装与恢复的传播契约。"]
#![doc = ""]
#![doc = "== 角色定位 =="]
#![doc = "调用线程上的每请求上下文需要在外部执行面（线程池、调度器、限时提交器）"]
#![doc = "选定的任意工作线程上精确重现：任务运行前安装快照，运行后无条件恢复先前值。"]
#![doc = "本 crate 只承载这一传播纪律；线程池本身、重试策略、跨进程传输均由外部协作者负责。"]
#![doc = ""]
#![doc = "== 不变式 =="]
#![doc = "1. 每次安装与恢复在同一线程上严格配对，失败与展开路径也不例外；"]
#![doc = "2. 同线程嵌套调用遵循 LIFO：内层恢复回到外层快照，而非外层调用前的值；"]
#![doc = "3. 快照在包装构造时刻固化，源上下文随后的变化不影响已捕获的快照。"]

pub mod adapter;
pub mod context;
pub mod error;
pub mod store;
pub mod surface;
pub mod task;

pub use adapter::{
    PropagatingExecutor, PropagatingScheduler, PropagatingStartTimeoutExecutor,
    PropagatingTaskService, PropagationPolicy,
};
pub use context::{AmbientContext, ContextSnapshot};
pub use error::{StoreError, TaskError, TaskErrorKind, TaskResult};
pub use store::{ContextStore, ThreadContextStore};
pub use surface::{
    ExecuteSurface, PeriodicHandle, ScheduledTaskSurface, StartTimeoutSurface, TaskFuture,
    TaskServiceSurface,
};
pub use task::{
    CallableTask, ContextCallable, ContextRunnable, PeriodicContextTask, PeriodicTask,
    RunnableTask,
};
