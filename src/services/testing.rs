//! In-memory fakes for the process-level seams

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::OpsConfig;
use crate::domain::container::{parse_ps_output, ContainerInfo};
use crate::domain::system::PlatformInfo;
use crate::error::{OpsError, OpsResult};
use crate::infra::{ComposeCommand, Database, HostEnv, RegistryApi, SourceControl, Stack};
use crate::services::prompt::Prompter;
use crate::state::OpsContext;

pub const RUNNING_PS: &str = "\
registry|registry-registry-1|running|Up 1 minute|0.0.0.0:8080->8080/tcp
postgres|registry-postgres-1|running|Up 1 minute (healthy)|0.0.0.0:5432->5432/tcp
";

/// 预设答案的实现，记录所有提示
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 已显示过的提示
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, prompt: &str) -> Option<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answers.lock().ok()?.pop_front()
    }
}

/// Shared call log
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.all().iter().any(|c| c == call)
    }
}

pub struct FakeStack {
    pub calls: Calls,
    pub ps: Mutex<Vec<ContainerInfo>>,
    pub logs: String,
    pub fail_up: bool,
}

impl FakeStack {
    pub fn new(calls: Calls) -> Self {
        Self {
            calls,
            ps: Mutex::new(parse_ps_output(RUNNING_PS)),
            logs: "registry-1 | listening on :8080".to_string(),
            fail_up: false,
        }
    }

    pub fn with_ps(self, ps: &str) -> Self {
        *self.ps.lock().unwrap() = parse_ps_output(ps);
        self
    }
}

#[async_trait]
impl Stack for FakeStack {
    async fn up(&self, build: bool) -> OpsResult<()> {
        self.calls.push(if build { "up --build" } else { "up" });
        if self.fail_up {
            return Err(OpsError::command("docker", "compose up failed"));
        }
        Ok(())
    }

    async fn down(&self, remove_volumes: bool) -> OpsResult<()> {
        self.calls.push(if remove_volumes { "down -v" } else { "down" });
        Ok(())
    }

    async fn restart(&self) -> OpsResult<()> {
        self.calls.push("restart");
        Ok(())
    }

    async fn ps(&self) -> OpsResult<Vec<ContainerInfo>> {
        self.calls.push("ps");
        Ok(self.ps.lock().unwrap().clone())
    }

    async fn logs_tail(&self, lines: usize) -> OpsResult<String> {
        self.calls.push(format!("logs_tail {}", lines));
        Ok(self.logs.clone())
    }

    async fn show_logs(&self, service: Option<&str>, tail: usize, follow: bool) -> OpsResult<()> {
        self.calls.push(format!(
            "logs {} {} {}",
            service.unwrap_or("*"),
            tail,
            follow
        ));
        Ok(())
    }

    async fn exec_interactive(&self, service: &str, command: &[String]) -> OpsResult<()> {
        self.calls.push(format!("exec {} {}", service, command.join(" ")));
        Ok(())
    }

    async fn resource_usage(&self) -> OpsResult<String> {
        self.calls.push("stats");
        Ok("NAME CPU MEM".to_string())
    }
}

pub struct FakeDatabase {
    pub calls: Calls,
    pub dump: String,
    pub fail_dump: bool,
    pub query_result: Result<String, String>,
    pub ready: bool,
}

impl FakeDatabase {
    pub fn new(calls: Calls) -> Self {
        Self {
            calls,
            dump: "-- PostgreSQL database dump\nCREATE TABLE servers ();\n".to_string(),
            fail_dump: false,
            query_result: Ok("active|2\ndeprecated|1\n".to_string()),
            ready: true,
        }
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn is_ready(&self) -> OpsResult<bool> {
        self.calls.push("pg_isready");
        Ok(self.ready)
    }

    async fn dump_to(&self, dest: &Path) -> OpsResult<()> {
        self.calls.push(format!("dump {}", dest.display()));
        if self.fail_dump {
            return Err(OpsError::command("pg_dump", "connection refused"));
        }
        std::fs::write(dest, &self.dump)?;
        Ok(())
    }

    async fn restore_from(&self, src: &Path) -> OpsResult<()> {
        self.calls.push(format!("restore {}", src.display()));
        Ok(())
    }

    async fn query(&self, sql: &str) -> OpsResult<String> {
        self.calls.push(format!("query {}", sql));
        self.query_result
            .clone()
            .map_err(|e| OpsError::command("psql", e))
    }
}

pub struct FakeSource {
    pub calls: Calls,
}

#[async_trait]
impl SourceControl for FakeSource {
    async fn clone_repo(&self, url: &str, dest: &Path) -> OpsResult<()> {
        self.calls.push(format!("clone {}", url));
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("docker-compose.yml"), "services: {}\n")?;
        Ok(())
    }

    async fn pull(&self, dir: &Path) -> OpsResult<String> {
        self.calls.push(format!("pull {}", dir.display()));
        Ok("Already up to date.".to_string())
    }
}

pub struct FakeHost {
    pub calls: Calls,
    pub platform: PlatformInfo,
    pub commands: Mutex<HashSet<String>>,
    pub busy_ports: Vec<u16>,
    /// Installs succeed but do not make the tool available
    pub broken_installs: bool,
}

impl FakeHost {
    pub fn ready(calls: Calls) -> Self {
        Self {
            calls,
            platform: PlatformInfo {
                os_family: "linux".to_string(),
                distro: Some("Ubuntu".to_string()),
                os_version: Some("24.04".to_string()),
                kernel_version: None,
                hostname: Some("ops-test".to_string()),
            },
            commands: Mutex::new(
                ["docker", "docker-compose-plugin", "git", "curl", "jq"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            busy_ports: Vec::new(),
            broken_installs: false,
        }
    }

    pub fn without(self, commands: &[&str]) -> Self {
        {
            let mut set = self.commands.lock().unwrap();
            for c in commands {
                set.remove(*c);
            }
        }
        self
    }

    fn add(&self, command: &str) {
        if !self.broken_installs {
            self.commands.lock().unwrap().insert(command.to_string());
        }
    }
}

#[async_trait]
impl HostEnv for FakeHost {
    fn platform(&self) -> PlatformInfo {
        self.platform.clone()
    }

    async fn has_command(&self, program: &str) -> bool {
        self.commands.lock().unwrap().contains(program)
    }

    async fn compose_command(&self) -> Option<ComposeCommand> {
        let has_plugin = self.commands.lock().unwrap().contains("docker-compose-plugin");
        has_plugin.then(ComposeCommand::plugin)
    }

    async fn install_docker(&self) -> OpsResult<()> {
        self.calls.push("install docker");
        self.add("docker");
        Ok(())
    }

    async fn install_compose_plugin(&self) -> OpsResult<()> {
        self.calls.push("install compose");
        self.add("docker-compose-plugin");
        Ok(())
    }

    async fn install_packages(&self, packages: &[String]) -> OpsResult<()> {
        self.calls.push(format!("install {}", packages.join(" ")));
        for p in packages {
            self.add(p);
        }
        Ok(())
    }

    async fn port_in_use(&self, port: u16) -> bool {
        self.calls.push(format!("port {}", port));
        self.busy_ports.contains(&port)
    }
}

/// Config rooted at `dir` with a fast poll
pub fn test_config(dir: &Path, api_base: &str) -> OpsConfig {
    let url = api_base.trim_start_matches("http://").to_string();
    let (host, port) = url.rsplit_once(':').unwrap_or(("127.0.0.1", "8080"));
    let host = host.to_string();
    let port = port.to_string();
    let dir: PathBuf = dir.to_path_buf();
    let mut config = OpsConfig::from_lookup(dir, move |key| match key {
        "REGISTRY_API_HOST" => Some(host.clone()),
        "API_PORT" => Some(port.clone()),
        "REGISTRY_REPO_URL" => Some("https://git.example.test/registry.git".to_string()),
        _ => None,
    });
    config.poll.interval = Duration::from_millis(10);
    config.poll.max_attempts = 3;
    config
}

/// Context wired to fakes; the deployment directory gets a marker file
pub struct TestContext {
    pub ctx: OpsContext,
    pub calls: Calls,
    pub prompter: Arc<ScriptedPrompter>,
    pub dir: tempfile::TempDir,
}

pub fn test_context(
    api_base: &str,
    answers: &[&str],
    customize: impl FnOnce(FakeStack, FakeDatabase) -> (FakeStack, FakeDatabase),
) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
    let calls = Calls::default();
    let (stack, db) = customize(FakeStack::new(calls.clone()), FakeDatabase::new(calls.clone()));
    let prompter = Arc::new(ScriptedPrompter::new(answers.iter().copied()));
    let config = Arc::new(test_config(dir.path(), api_base));

    let ctx = OpsContext {
        api: RegistryApi::new(config.api_base_url()).unwrap(),
        config,
        stack: Arc::new(stack),
        db: Arc::new(db),
        source: Arc::new(FakeSource { calls: calls.clone() }),
        prompter: prompter.clone(),
        settle_delay: Duration::from_millis(1),
    };

    TestContext {
        ctx,
        calls,
        prompter,
        dir,
    }
}
