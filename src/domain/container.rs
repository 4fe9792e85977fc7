//! 容器相关领域模型

/// `docker compose ps` 使用的输出格式
pub const PS_FORMAT: &str = "{{.Service}}|{{.Name}}|{{.State}}|{{.Status}}|{{.Ports}}";

/// 容器信息
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    pub service: String,
    pub name: String,
    pub state: String,
    pub status: String,
    pub ports: Vec<String>,
}

impl ContainerInfo {
    /// 解析一行 `PS_FORMAT` 输出
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 3 {
            return None;
        }
        Some(Self {
            service: parts[0].trim().to_string(),
            name: parts[1].trim().to_string(),
            state: parts[2].trim().to_lowercase(),
            status: parts.get(3).unwrap_or(&"").trim().to_string(),
            ports: parts
                .get(4)
                .unwrap_or(&"")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// 解析整段 ps 输出
pub fn parse_ps_output(output: &str) -> Vec<ContainerInfo> {
    output.lines().filter_map(ContainerInfo::parse_line).collect()
}

/// 查找指定服务且处于 running 状态的容器
pub fn service_running(containers: &[ContainerInfo], service: &str) -> bool {
    containers
        .iter()
        .any(|c| c.service == service && c.is_running())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: &str = "\
registry|registry-registry-1|running|Up 2 minutes|0.0.0.0:8080->8080/tcp
postgres|registry-postgres-1|running|Up 2 minutes (healthy)|0.0.0.0:5432->5432/tcp, :::5432->5432/tcp

worker|registry-worker-1|exited|Exited (1) 5 seconds ago|
";

    #[test]
    fn test_parse_ps_output() {
        let containers = parse_ps_output(PS);
        assert_eq!(containers.len(), 3);
        assert_eq!(containers[0].service, "registry");
        assert_eq!(containers[1].ports.len(), 2);
        assert!(containers[2].ports.is_empty());
        assert!(!containers[2].is_running());
    }

    #[test]
    fn test_service_running() {
        let containers = parse_ps_output(PS);
        assert!(service_running(&containers, "registry"));
        assert!(service_running(&containers, "postgres"));
        assert!(!service_running(&containers, "worker"));
        assert!(!service_running(&containers, "missing"));
    }

    #[test]
    fn test_state_is_case_insensitive() {
        let c = ContainerInfo::parse_line("api|api-1|Running|Up").unwrap();
        assert!(c.is_running());
    }

    #[test]
    fn test_rejects_malformed_line() {
        assert!(ContainerInfo::parse_line("garbage").is_none());
        assert!(ContainerInfo::parse_line("   ").is_none());
    }
}
