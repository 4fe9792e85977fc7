//! Git 源码获取与更新

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::{OpsError, OpsResult};
use crate::infra::command::CommandRunner;

const CLONE_TIMEOUT: Duration = Duration::from_secs(600);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);

/// 版本控制操作
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// clone 到 `dest`（`dest` 不存在或为空目录）
    async fn clone_repo(&self, url: &str, dest: &Path) -> OpsResult<()>;
    /// 在 `dir` 中 fast-forward 更新，返回 git 输出
    async fn pull(&self, dir: &Path) -> OpsResult<String>;
}

/// git CLI 实现
pub struct GitClient;

#[async_trait]
impl SourceControl for GitClient {
    async fn clone_repo(&self, url: &str, dest: &Path) -> OpsResult<()> {
        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let dest_str = dest.to_string_lossy().to_string();
        CommandRunner::run_streaming(
            "git",
            &["clone", url, dest_str.as_str()],
            parent,
            &[],
            CLONE_TIMEOUT,
        )
        .await
        .map_err(OpsError::from)
    }

    async fn pull(&self, dir: &Path) -> OpsResult<String> {
        CommandRunner::run_checked("git", &["pull", "--ff-only"], dir, &[], PULL_TIMEOUT)
            .await
            .map_err(OpsError::from)
    }
}
