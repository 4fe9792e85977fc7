//! 部署阶段领域模型

use chrono::{DateTime, Utc};

/// 阶段状态
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StageStatus {
    /// 阶段汇总中使用的图标
    pub fn icon(&self) -> &'static str {
        match self {
            StageStatus::Success => "✓",
            StageStatus::Failed => "✗",
            StageStatus::Skipped => "⊘",
            StageStatus::Running => "⟳",
            StageStatus::Pending => "○",
        }
    }
}

/// 流水线中的一个阶段
#[derive(Clone, Debug)]
pub struct DeployStage {
    /// 阶段标识，如 "ports"、"readiness"
    pub name: String,
    /// 显示名称，如 "Port Check"
    pub display_name: String,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// 耗时（毫秒），结束时计算
    pub duration_ms: Option<i64>,
    /// 失败原因或跳过原因
    pub message: Option<String>,
}

impl DeployStage {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            status: StageStatus::Pending,
            started_at: None,
            duration_ms: None,
            message: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StageStatus::Running;
    }

    /// 结束阶段，记录耗时
    pub fn finish(&mut self, success: bool, message: Option<String>) {
        self.status = if success {
            StageStatus::Success
        } else {
            StageStatus::Failed
        };
        self.duration_ms = self
            .started_at
            .map(|started| (Utc::now() - started).num_milliseconds());
        self.message = message;
    }

    /// 未执行的阶段
    pub fn skip(&mut self, reason: Option<String>) {
        self.status = StageStatus::Skipped;
        self.message = reason;
    }

    /// 汇总行，如 `✓ Port Check (12ms)`
    pub fn summary_line(&self) -> String {
        let duration = self
            .duration_ms
            .map(|d| format!("{}ms", d))
            .unwrap_or_else(|| "-".to_string());
        match &self.message {
            Some(msg) => format!(
                "{} {} ({}) - {}",
                self.status.icon(),
                self.display_name,
                duration,
                msg
            ),
            None => format!("{} {} ({})", self.status.icon(), self.display_name, duration),
        }
    }
}

/// 部署流水线的固定阶段，按执行顺序排列
pub const PIPELINE_STAGES: &[(&str, &str)] = &[
    ("platform", "Host Platform"),
    ("docker", "Container Runtime"),
    ("compose", "Compose Tool"),
    ("tools", "Auxiliary Tools"),
    ("ports", "Port Check"),
    ("source", "Source Checkout"),
    ("launch", "Compose Up"),
    ("readiness", "Readiness"),
    ("verify", "Verification"),
];

/// 创建流水线全部阶段
pub fn pipeline_stages() -> Vec<DeployStage> {
    PIPELINE_STAGES
        .iter()
        .map(|(name, display)| DeployStage::new(name, display))
        .collect()
}
