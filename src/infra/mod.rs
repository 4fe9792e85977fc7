//! 基础设施模块
//!
//! 封装外部依赖（命令执行、compose、数据库客户端、HTTP client、git、宿主机）

pub mod command;
pub mod compose;
pub mod database;
pub mod git;
pub mod host;
pub mod registry_api;

pub use command::CommandRunner;
pub use compose::{ComposeCommand, ComposeStack, Stack};
pub use database::{Database, PostgresClient};
pub use git::{GitClient, SourceControl};
pub use host::{HostEnv, LocalHost};
pub use registry_api::RegistryApi;
