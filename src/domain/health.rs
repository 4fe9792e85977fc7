//! 服务健康状态相关领域模型
//!
//! 只做判定，不做 I/O：HTTP 探测结果由 `infra::registry_api` 产生

use serde::Deserialize;

use crate::config::constants::{HEALTH_OK, PING_TOKEN};

/// 健康检查响应（只关心 status 字段，其余字段忽略）
#[derive(Debug, Clone, Deserialize)]
pub struct HealthPayload {
    pub status: String,
}

/// 列表接口响应
#[derive(Debug, Clone, Deserialize)]
pub struct ListPayload {
    #[serde(default)]
    pub count: u64,
}

/// 单次探测结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// 通过，附带展示信息
    Pass(String),
    /// 未通过，附带原因
    Fail(String),
}

impl ProbeOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ProbeOutcome::Pass(_))
    }

    pub fn detail(&self) -> &str {
        match self {
            ProbeOutcome::Pass(d) | ProbeOutcome::Fail(d) => d,
        }
    }
}

/// 存活探测：响应体去掉首尾空白后必须是字面值 `pong`
pub fn check_ping_body(body: &str) -> ProbeOutcome {
    let trimmed = body.trim();
    if trimmed == PING_TOKEN {
        ProbeOutcome::Pass(format!("responded {}", PING_TOKEN))
    } else {
        ProbeOutcome::Fail(format!("unexpected body: {:?}", truncate(trimmed, 80)))
    }
}

/// 健康检查：JSON 中 status 字段必须为 `ok`
pub fn check_health_body(body: &str) -> ProbeOutcome {
    match serde_json::from_str::<HealthPayload>(body) {
        Ok(payload) if payload.status == HEALTH_OK => {
            ProbeOutcome::Pass(format!("status={}", payload.status))
        }
        Ok(payload) => ProbeOutcome::Fail(format!("status={}", payload.status)),
        Err(e) => ProbeOutcome::Fail(format!("invalid health payload: {}", e)),
    }
}

/// 列表检查：count 必须大于 0
pub fn check_list_body(body: &str) -> ProbeOutcome {
    match serde_json::from_str::<ListPayload>(body) {
        Ok(payload) if payload.count > 0 => ProbeOutcome::Pass(format!("{} records", payload.count)),
        Ok(_) => ProbeOutcome::Fail("listing returned 0 records".to_string()),
        Err(e) => ProbeOutcome::Fail(format!("invalid listing payload: {}", e)),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
