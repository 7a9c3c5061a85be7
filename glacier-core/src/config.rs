use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 集群客户端配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClusterConfig {
    /// 集群入口主机列表，构造顺序即选择时的平局顺序
    pub hosts: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 单次请求超时
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// 健康检查间隔，供外部驱动循环使用
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            user: None,
            password: None,
            timeout_seconds: default_timeout(),
            check_interval_seconds: default_check_interval(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            anyhow::bail!("cluster config must list at least one host");
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_check_interval() -> u64 {
    5
}

pub fn load_config() -> Result<ClusterConfig> {
    load_config_from_path("glacier.toml")
}

pub fn load_config_from_path(config_path: &str) -> Result<ClusterConfig> {
    let config_str = std::fs::read_to_string(config_path)?;
    let config: ClusterConfig = toml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}
