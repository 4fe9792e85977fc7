//! 宿主平台信息

/// 支持的发行版名称（`sysinfo::System::name()` 的返回值）
pub const SUPPORTED_DISTROS: &[&str] = &["Ubuntu", "Debian", "Debian GNU/Linux"];

/// 宿主平台信息
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformInfo {
    /// `std::env::consts::OS`
    pub os_family: String,
    /// 发行版名称
    pub distro: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub hostname: Option<String>,
}

impl PlatformInfo {
    /// 平台签名是否匹配：Linux + Ubuntu/Debian
    pub fn check(&self) -> Result<(), String> {
        if self.os_family != "linux" {
            return Err(format!(
                "expected a Linux host, found {}",
                self.os_family
            ));
        }
        match self.distro.as_deref() {
            Some(name) if SUPPORTED_DISTROS.iter().any(|d| name.eq_ignore_ascii_case(d)) => Ok(()),
            Some(name) => Err(format!(
                "unsupported distribution {} (expected one of: {})",
                name,
                SUPPORTED_DISTROS.join(", ")
            )),
            None => Err("unable to determine the Linux distribution".to_string()),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {}",
            self.distro.as_deref().unwrap_or("unknown"),
            self.os_version.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}
