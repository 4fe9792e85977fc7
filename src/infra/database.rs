//! PostgreSQL 客户端
//!
//! 所有操作通过 compose exec 在数据库容器内执行 pg_isready / pg_dump / psql，
//! 宿主机不需要安装 PostgreSQL 客户端

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use crate::config::OpsConfig;
use crate::domain::database::RESET_SCHEMA_SQL;
use crate::error::{OpsError, OpsResult};
use crate::infra::command::CommandRunner;
use crate::infra::compose::ComposeCommand;

const READY_TIMEOUT: Duration = Duration::from_secs(15);
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);
const DUMP_TIMEOUT: Duration = Duration::from_secs(3600);

/// 数据库操作
#[async_trait]
pub trait Database: Send + Sync {
    /// pg_isready
    async fn is_ready(&self) -> OpsResult<bool>;
    /// 完整导出到文件
    async fn dump_to(&self, dest: &Path) -> OpsResult<()>;
    /// 清空 public schema 后从文件恢复，两步在同一个事务内，加载失败时原数据保留
    async fn restore_from(&self, src: &Path) -> OpsResult<()>;
    /// 执行查询，返回 `psql -At -F '|'` 格式的输出
    async fn query(&self, sql: &str) -> OpsResult<String>;
}

/// 通过 compose exec 访问的 PostgreSQL
pub struct PostgresClient {
    config: Arc<OpsConfig>,
    compose: ComposeCommand,
}

impl PostgresClient {
    pub fn new(config: Arc<OpsConfig>, compose: ComposeCommand) -> Self {
        Self { config, compose }
    }

    /// `exec -T -e PGPASSWORD=... <db_service> <program> ...`
    fn exec_args(&self, program: &str, args: &[&str]) -> Vec<String> {
        let mut full = vec![
            "exec".to_string(),
            "-T".to_string(),
            "-e".to_string(),
            format!("PGPASSWORD={}", self.config.db.password),
            self.config.db_service.clone(),
            program.to_string(),
        ];
        full.extend(args.iter().map(|a| a.to_string()));
        self.compose.args(&full)
    }

    fn psql_args<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![
            "-U",
            self.config.db.user.as_str(),
            "-d",
            self.config.db.name.as_str(),
            "-v",
            "ON_ERROR_STOP=1",
        ];
        args.extend_from_slice(extra);
        args
    }
}

#[async_trait]
impl Database for PostgresClient {
    async fn is_ready(&self) -> OpsResult<bool> {
        let args = self.exec_args(
            "pg_isready",
            &["-U", self.config.db.user.as_str(), "-d", self.config.db.name.as_str()],
        );
        let output = CommandRunner::run_simple(
            self.compose.program,
            &args,
            &self.config.work_dir,
            &self.config.compose_env(),
            READY_TIMEOUT,
        )
        .await?;
        Ok(output.status.success())
    }

    async fn dump_to(&self, dest: &Path) -> OpsResult<()> {
        let args = self.exec_args(
            "pg_dump",
            &[
                "-U",
                self.config.db.user.as_str(),
                "-d",
                self.config.db.name.as_str(),
                "--no-owner",
            ],
        );
        let result = CommandRunner::run_to_file(
            self.compose.program,
            &args,
            &self.config.work_dir,
            &self.config.compose_env(),
            dest,
            DUMP_TIMEOUT,
        )
        .await;

        if let Err(e) = result {
            error!(error = %e, dest = %dest.display(), "pg_dump failed");
            // 不保留不完整的备份文件
            let _ = std::fs::remove_file(dest);
            return Err(e.into());
        }
        Ok(())
    }

    async fn restore_from(&self, src: &Path) -> OpsResult<()> {
        // -1: 重置和加载同一个事务，任一步失败整体回滚
        let args = self.exec_args(
            "psql",
            &self.psql_args(&["-1", "-q", "-c", RESET_SCHEMA_SQL, "-f", "-"]),
        );
        CommandRunner::run_from_file(
            self.compose.program,
            &args,
            &self.config.work_dir,
            &self.config.compose_env(),
            src,
            DUMP_TIMEOUT,
        )
        .await
        .map(|_| ())
        .map_err(|e| {
            error!(error = %e, src = %src.display(), "Restore failed");
            OpsError::from(e)
        })
    }

    async fn query(&self, sql: &str) -> OpsResult<String> {
        let args = self.exec_args("psql", &self.psql_args(&["-At", "-F", "|", "-c", sql]));
        CommandRunner::run_checked(
            self.compose.program,
            &args,
            &self.config.work_dir,
            &self.config.compose_env(),
            QUERY_TIMEOUT,
        )
        .await
        .map_err(OpsError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn client() -> PostgresClient {
        let config = OpsConfig::from_lookup(PathBuf::from("/srv/registry"), |_| None);
        PostgresClient::new(Arc::new(config), ComposeCommand::plugin())
    }

    /// 使用指定命令代替 docker compose 的客户端
    fn client_with(work_dir: &Path, compose: ComposeCommand) -> PostgresClient {
        let config = OpsConfig::from_lookup(work_dir.to_path_buf(), |_| None);
        PostgresClient::new(Arc::new(config), compose)
    }

    /// 写一个记录参数的假 compose 脚本（经 sh 执行）；读 stdin 的调用以 3 退出
    fn failing_load_script(dir: &Path) -> (ComposeCommand, PathBuf) {
        let log = dir.join("calls.log");
        let script = dir.join("fake-compose");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 echo \"$*\" >> '{}'\n\
                 for arg in \"$@\"; do\n\
                 \x20 if [ \"$arg\" = \"-\" ]; then\n\
                 \x20   cat > /dev/null\n\
                 \x20   echo 'ERROR: syntax error at line 3' >&2\n\
                 \x20   exit 3\n\
                 \x20 fi\n\
                 done\n\
                 exit 0\n",
                log.display()
            ),
        )
        .unwrap();
        let script: &'static str = Box::leak(script.display().to_string().into_boxed_str());
        let compose = ComposeCommand {
            program: "sh",
            base_args: vec![script],
        };
        (compose, log)
    }

    #[test]
    fn test_exec_args() {
        let args = client().exec_args("pg_isready", &["-U", "registry"]);
        assert_eq!(
            args,
            vec![
                "compose",
                "exec",
                "-T",
                "-e",
                "PGPASSWORD=registry",
                "postgres",
                "pg_isready",
                "-U",
                "registry"
            ]
        );
    }

    #[test]
    fn test_psql_args_stop_on_error() {
        let c = client();
        let args = c.psql_args(&["-c", "SELECT 1"]);
        assert_eq!(
            args,
            vec!["-U", "registry", "-d", "registry", "-v", "ON_ERROR_STOP=1", "-c", "SELECT 1"]
        );
    }

    #[test]
    fn test_restore_args_single_transaction() {
        let c = client();
        let args = c.exec_args(
            "psql",
            &c.psql_args(&["-1", "-q", "-c", RESET_SCHEMA_SQL, "-f", "-"]),
        );
        let tail: Vec<&str> = args.iter().skip(6).map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "psql",
                "-U",
                "registry",
                "-d",
                "registry",
                "-v",
                "ON_ERROR_STOP=1",
                "-1",
                "-q",
                "-c",
                RESET_SCHEMA_SQL,
                "-f",
                "-"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_load_runs_reset_in_same_session() {
        let dir = tempfile::tempdir().unwrap();
        let (compose, log) = failing_load_script(dir.path());
        let backup = dir.path().join("broken.sql");
        std::fs::write(&backup, "CREATE TABLE servers (\n  id int\n garbage\n").unwrap();

        let err = client_with(dir.path(), compose)
            .restore_from(&backup)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("syntax error"));

        // 只有一次 psql 调用，重置语句和加载在一起，由 -1 一起回滚
        let calls = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 1, "calls: {:?}", lines);
        assert!(lines[0].contains(" -1 "));
        assert!(lines[0].contains(RESET_SCHEMA_SQL));
        assert!(lines[0].ends_with("-f -"));
    }

    #[tokio::test]
    async fn test_failed_dump_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("registry_backup_20260101_000000.sql");
        std::fs::write(&dest, "-- partial\n").unwrap();

        let compose = ComposeCommand {
            program: "false",
            base_args: vec![],
        };
        let result = client_with(dir.path(), compose).dump_to(&dest).await;

        assert!(result.is_err());
        assert!(!dest.exists());
    }
}
