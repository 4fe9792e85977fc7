//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// 运行配置
///
/// 启动时构造一次，之后只读，通过 `Arc` 传给所有操作
#[derive(Clone, Debug)]
pub struct OpsConfig {
    /// 部署根目录（包含 docker-compose.yml）
    pub work_dir: PathBuf,
    /// API 端口
    pub api_port: u16,
    /// 数据库端口
    pub db_port: u16,
    /// 源码仓库地址（仅在需要 clone 时使用）
    pub repo_url: Option<String>,
    /// HTTP 探测使用的主机名
    pub api_host: String,
    /// compose 中 API 服务名
    pub api_service: String,
    /// compose 中数据库服务名
    pub db_service: String,
    /// 数据库凭据
    pub db: DbCredentials,
    /// 备份目录
    pub backup_dir: PathBuf,
    /// 本地数据目录（clean 时删除）
    pub data_dir: PathBuf,
    /// 就绪轮询配置
    pub poll: PollConfig,
}

/// 数据库凭据
#[derive(Clone, Debug, PartialEq)]
pub struct DbCredentials {
    pub user: String,
    pub name: String,
    pub password: String,
}

/// 就绪轮询配置
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(constants::POLL_INTERVAL_SECS),
            max_attempts: constants::POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    /// 最长等待时间，溢出时取 `Duration::MAX`
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }
}

impl OpsConfig {
    /// 从环境变量加载配置，`overrides`（通常来自命令行参数）优先于环境变量
    pub fn from_env_with(default_dir: PathBuf, overrides: &[(&str, Option<String>)]) -> Self {
        Self::from_lookup(default_dir, |key| {
            overrides
                .iter()
                .find(|(k, v)| *k == key && v.is_some())
                .and_then(|(_, v)| v.clone())
                .or_else(|| env::var(key).ok())
        })
    }

    /// 从任意键值来源加载配置，`default_dir` 是 `REGISTRY_DIR` 未设置时的部署目录
    pub fn from_lookup<F>(default_dir: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let work_dir = get("REGISTRY_DIR").map(PathBuf::from).unwrap_or(default_dir);

        let api_port = parse_or(&get, "API_PORT", constants::DEFAULT_API_PORT);
        let db_port = parse_or(&get, "DB_PORT", constants::DEFAULT_DB_PORT);

        let repo_url = get("REGISTRY_REPO_URL");
        let api_host = get("REGISTRY_API_HOST").unwrap_or_else(|| "localhost".to_string());
        let api_service =
            get("REGISTRY_API_SERVICE").unwrap_or_else(|| constants::API_SERVICE.to_string());
        let db_service =
            get("REGISTRY_DB_SERVICE").unwrap_or_else(|| constants::DB_SERVICE.to_string());

        let db = DbCredentials {
            user: get("REGISTRY_DB_USER").unwrap_or_else(|| constants::DB_USER.to_string()),
            name: get("REGISTRY_DB_NAME").unwrap_or_else(|| constants::DB_NAME.to_string()),
            password: get("REGISTRY_DB_PASSWORD")
                .unwrap_or_else(|| constants::DB_PASSWORD.to_string()),
        };

        let backup_dir = get("REGISTRY_BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.join(constants::BACKUP_DIR));
        let data_dir = get("REGISTRY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.join(constants::DATA_DIR));

        let interval_secs: u64 = parse_or(
            &get,
            "REGISTRY_POLL_INTERVAL_SECS",
            constants::POLL_INTERVAL_SECS,
        );
        let max_attempts: u32 =
            parse_or(&get, "REGISTRY_POLL_ATTEMPTS", constants::POLL_MAX_ATTEMPTS);
        let poll = PollConfig {
            interval: Duration::from_secs(interval_secs),
            max_attempts: max_attempts.max(1),
        };

        Self {
            work_dir,
            api_port,
            db_port,
            repo_url,
            api_host,
            api_service,
            db_service,
            db,
            backup_dir,
            data_dir,
            poll,
        }
    }

    /// API 基础地址
    pub fn api_base_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.api_port)
    }

    /// 数据库连接串（用于部署完成后的提示信息）
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.api_host, self.db_port, self.db.name
        )
    }

    /// 传给 compose 的环境变量
    pub fn compose_env(&self) -> Vec<(String, String)> {
        vec![
            ("API_PORT".to_string(), self.api_port.to_string()),
            ("DB_PORT".to_string(), self.db_port.to_string()),
        ]
    }

    /// 标记文件路径
    pub fn marker_path(&self) -> PathBuf {
        self.work_dir.join(constants::MARKER_FILE)
    }
}

/// 当前工作目录
pub fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "Invalid value, using default");
                default
            }
        },
        None => default,
    }
}

/// 常量
pub mod constants {
    /// 标记文件，存在即表示有效的部署根目录
    pub const MARKER_FILE: &str = "docker-compose.yml";

    pub const DEFAULT_API_PORT: u16 = 8080;
    pub const DEFAULT_DB_PORT: u16 = 5432;

    pub const API_SERVICE: &str = "registry";
    pub const DB_SERVICE: &str = "postgres";

    pub const DB_USER: &str = "registry";
    pub const DB_NAME: &str = "registry";
    pub const DB_PASSWORD: &str = "registry";

    /// 被 stats 分组统计的表和列
    pub const RECORDS_TABLE: &str = "servers";
    pub const STATUS_COLUMN: &str = "status";

    pub const BACKUP_DIR: &str = "backups";
    pub const DATA_DIR: &str = "data";

    /// HTTP 端点
    pub const PING_PATH: &str = "/v0/ping";
    pub const HEALTH_PATH: &str = "/v0/health";
    pub const LIST_PATH: &str = "/v0/servers";

    /// 存活探测期望返回的字面值
    pub const PING_TOKEN: &str = "pong";
    /// 健康检查 status 字段期望值
    pub const HEALTH_OK: &str = "ok";

    /// 就绪轮询间隔（秒）
    pub const POLL_INTERVAL_SECS: u64 = 2;
    /// 就绪轮询最大次数
    pub const POLL_MAX_ATTEMPTS: u32 = 60;

    /// start/restart/update 之后等待多久再探测一次（秒）
    pub const SETTLE_DELAY_SECS: u64 = 5;

    /// 失败时输出的日志行数
    pub const FAILURE_LOG_LINES: usize = 50;

    /// 辅助工具
    pub const AUX_TOOLS: &[&str] = &["git", "curl", "jq"];

    /// 端点测试脚本候选路径（相对部署根目录）
    pub const ENDPOINT_TEST_SCRIPTS: &[&str] = &["scripts/test_endpoints.sh", "test_endpoints.sh"];

    /// 部署命令在未设置 REGISTRY_DIR 时 clone 到的子目录
    pub const DEFAULT_CHECKOUT_DIR: &str = "registry";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
