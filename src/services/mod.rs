//! 业务服务模块
//!
//! 部署流水线与管理命令，以及它们共用的轮询和交互确认

pub mod deploy;
pub mod manage;
pub mod prompt;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use deploy::Deployer;
pub use manage::{dispatch, Verb};
