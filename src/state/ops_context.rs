//! 管理命令上下文

use std::sync::Arc;
use std::time::Duration;

use crate::config::{constants, OpsConfig};
use crate::error::{OpsError, OpsResult};
use crate::infra::{
    ComposeCommand, ComposeStack, Database, GitClient, PostgresClient, RegistryApi, SourceControl,
    Stack,
};
use crate::services::prompt::Prompter;

/// 管理命令执行上下文
///
/// 每次调用构造一次，所有 handler 共享
pub struct OpsContext {
    /// 运行配置（只读）
    pub config: Arc<OpsConfig>,
    /// compose 栈
    pub stack: Arc<dyn Stack>,
    /// 数据库客户端
    pub db: Arc<dyn Database>,
    /// 源码更新
    pub source: Arc<dyn SourceControl>,
    /// API 客户端
    pub api: RegistryApi,
    /// 交互输入
    pub prompter: Arc<dyn Prompter>,
    /// start/restart/update 之后的等待时间
    pub settle_delay: Duration,
}

impl OpsContext {
    /// 用真实的 docker / psql / git 实现构造上下文
    pub async fn connect(config: OpsConfig, prompter: Arc<dyn Prompter>) -> OpsResult<Self> {
        ensure_deployment_dir(&config)?;
        let compose = ComposeCommand::detect().await.ok_or_else(|| {
            OpsError::MissingDependency(
                "docker compose (neither `docker compose` nor `docker-compose` found)".to_string(),
            )
        })?;
        let config = Arc::new(config);
        let api = RegistryApi::new(config.api_base_url())?;

        Ok(Self {
            stack: Arc::new(ComposeStack::new(config.clone(), compose.clone())),
            db: Arc::new(PostgresClient::new(config.clone(), compose)),
            source: Arc::new(GitClient),
            api,
            prompter,
            settle_delay: Duration::from_secs(constants::SETTLE_DELAY_SECS),
            config,
        })
    }

    /// 工作目录必须包含标记文件
    pub fn ensure_deployment_dir(&self) -> OpsResult<()> {
        ensure_deployment_dir(&self.config)
    }
}

/// 工作目录必须包含标记文件
pub fn ensure_deployment_dir(config: &OpsConfig) -> OpsResult<()> {
    if config.marker_path().is_file() {
        Ok(())
    } else {
        Err(OpsError::NotDeploymentDir(
            config.work_dir.display().to_string(),
            constants::MARKER_FILE,
        ))
    }
}
