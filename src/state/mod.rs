//! 运行时状态模块
//!
//! 管理命令的执行上下文

pub mod ops_context;

pub use ops_context::{ensure_deployment_dir, OpsContext};
