//! 部署服务模块
//!
//! 从"未运行"到"已验证健康"的单次部署流水线：
//! platform → docker → compose → tools → ports → source → launch → readiness → verify。
//! 任一阶段失败即终止，结束时总是打印阶段汇总。

pub mod checkout;
pub mod preflight;
pub mod readiness;
pub mod summary;

use std::sync::Arc;
use tracing::{error, info};

use crate::config::{constants, OpsConfig};
use crate::console;
use crate::domain::deploy::{pipeline_stages, DeployStage, StageStatus};
use crate::error::{OpsError, OpsResult};
use crate::infra::{
    ComposeCommand, ComposeStack, GitClient, HostEnv, LocalHost, RegistryApi, SourceControl, Stack,
};
use crate::services::prompt::Prompter;

/// 根据探测到的 compose 命令构造栈
pub type StackFactory = Box<dyn Fn(ComposeCommand) -> Arc<dyn Stack> + Send + Sync>;

/// 部署执行器
pub struct Deployer {
    config: Arc<OpsConfig>,
    host: Arc<dyn HostEnv>,
    source: Arc<dyn SourceControl>,
    prompter: Arc<dyn Prompter>,
    api: RegistryApi,
    stack_factory: StackFactory,
}

/// 阶段进度跟踪
struct Pipeline {
    stages: Vec<DeployStage>,
}

impl Pipeline {
    fn new() -> Self {
        Self {
            stages: pipeline_stages(),
        }
    }

    fn begin(&mut self, name: &str) -> usize {
        let total = self.stages.len();
        let idx = self
            .stages
            .iter()
            .position(|s| s.name == name)
            .unwrap_or(total - 1);
        let stage = &mut self.stages[idx];
        stage.start();
        console::step(idx + 1, total, &stage.display_name);
        idx
    }

    fn finish<T>(&mut self, idx: usize, result: OpsResult<T>) -> OpsResult<T> {
        match &result {
            Ok(_) => self.stages[idx].finish(true, None),
            Err(e) => self.stages[idx].finish(false, Some(e.to_string())),
        }
        result
    }

    /// 失败后未执行的阶段标记为跳过
    fn skip_remaining(&mut self) {
        for stage in self.stages.iter_mut() {
            if stage.status == StageStatus::Pending {
                stage.skip(Some("not reached".to_string()));
            }
        }
    }

    fn failed_stage(&self) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Failed)
            .map(|s| s.name.as_str())
    }
}

impl Deployer {
    pub fn new(
        config: Arc<OpsConfig>,
        host: Arc<dyn HostEnv>,
        source: Arc<dyn SourceControl>,
        prompter: Arc<dyn Prompter>,
        stack_factory: StackFactory,
    ) -> OpsResult<Self> {
        let api = RegistryApi::new(config.api_base_url())?;
        Ok(Self {
            config,
            host,
            source,
            prompter,
            api,
            stack_factory,
        })
    }

    /// 使用本机 docker / git 的部署器
    pub fn local(config: OpsConfig, prompter: Arc<dyn Prompter>) -> OpsResult<Self> {
        let config = Arc::new(config);
        let stack_config = config.clone();
        Self::new(
            config,
            Arc::new(LocalHost),
            Arc::new(GitClient),
            prompter,
            Box::new(move |compose| {
                Arc::new(ComposeStack::new(stack_config.clone(), compose)) as Arc<dyn Stack>
            }),
        )
    }

    /// 执行完整部署
    pub async fn run(&self) -> OpsResult<()> {
        self.execute().await.1
    }

    /// 执行部署，返回各阶段状态和最终结果
    async fn execute(&self) -> (Vec<DeployStage>, OpsResult<()>) {
        console::header(&format!("Registry deployment v{}", constants::VERSION));
        console::kv("Directory", &self.config.work_dir.display().to_string());
        console::kv("API port", &self.config.api_port.to_string());
        console::kv("Database port", &self.config.db_port.to_string());
        info!(
            dir = %self.config.work_dir.display(),
            api_port = self.config.api_port,
            db_port = self.config.db_port,
            "Starting deployment"
        );

        let mut pipeline = Pipeline::new();
        let result = self.run_stages(&mut pipeline).await;
        if result.is_err() {
            pipeline.skip_remaining();
        }

        summary::print_stage_summary(&pipeline.stages);
        match &result {
            Ok(()) => {
                info!("Deployment completed");
                summary::print_access_info(&self.config);
            }
            Err(e) => {
                let stage = pipeline.failed_stage().unwrap_or("deploy");
                error!(stage, error = %e, "Deployment failed");
                console::fatal(stage, &e.to_string());
            }
        }

        (pipeline.stages, result)
    }

    async fn run_stages(&self, p: &mut Pipeline) -> OpsResult<()> {
        let host = self.host.as_ref();

        let i = p.begin("platform");
        p.finish(i, preflight::ensure_platform(host))?;

        let i = p.begin("docker");
        p.finish(i, preflight::ensure_docker(host).await)?;

        let i = p.begin("compose");
        let compose = p.finish(i, preflight::ensure_compose(host).await)?;

        let i = p.begin("tools");
        p.finish(i, preflight::ensure_tools(host, constants::AUX_TOOLS).await)?;

        let i = p.begin("ports");
        p.finish(i, preflight::ensure_ports_free(host, &self.config).await)?;

        let i = p.begin("source");
        let prepared =
            checkout::prepare_source(self.source.as_ref(), self.prompter.as_ref(), &self.config)
                .await;
        p.finish(i, prepared)?;

        let stack = (self.stack_factory)(compose);

        let i = p.begin("launch");
        p.finish(i, stack.up(true).await)?;

        let i = p.begin("readiness");
        let ready = readiness::wait_until_ready(&self.api, self.config.poll).await;
        if ready.is_err() {
            readiness::dump_recent_logs(stack.as_ref(), constants::FAILURE_LOG_LINES).await;
        }
        p.finish(i, ready)?;

        let i = p.begin("verify");
        let verified = readiness::verify(&self.api, stack.as_ref(), &self.config).await;
        if let Err(OpsError::Verification(_)) = &verified {
            readiness::dump_recent_logs(stack.as_ref(), constants::FAILURE_LOG_LINES).await;
        }
        p.finish(i, verified)
    }
}
