//! 领域模型模块
//!
//! 纯数据结构与判定逻辑，不执行外部命令

pub mod backup;
pub mod container;
pub mod database;
pub mod deploy;
pub mod health;
pub mod system;

// Re-exports for convenience
pub use backup::BackupFile;
pub use container::ContainerInfo;
pub use database::StatusCount;
pub use deploy::{DeployStage, StageStatus};
pub use health::{HealthPayload, ListPayload, ProbeOutcome};
pub use system::PlatformInfo;
