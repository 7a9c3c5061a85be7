use crate::error::{Error, Result};
use crate::query::Query;
use crate::transport::Transport;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const PING_STMT: &str = "SELECT 1";
const PING_RESPONSE: &str = "1";

/// 到单个主机的连接句柄
/// 只保存主机地址、传输层与连接级URL参数，本身无状态；
/// 集群按引用区分连接，配置相同的两个连接也是不同实体
pub struct Conn {
    host: String,
    transport: Arc<dyn Transport>,
    params: Vec<(String, String)>,
}

impl Conn {
    pub fn new(host: impl AsRef<str>, transport: Arc<dyn Transport>) -> Self {
        Self {
            host: normalize_host(host.as_ref()),
            transport,
            params: Vec::new(),
        }
    }

    /// 创建带 user/password 参数的连接
    pub fn with_auth(
        host: impl AsRef<str>,
        transport: Arc<dyn Transport>,
        user: &str,
        password: &str,
    ) -> Self {
        let mut conn = Self::new(host, transport);
        conn.add_param("user", user);
        conn.add_param("password", password);
        conn
    }

    /// 设置连接级参数，如 max_execution_time
    /// 同名参数被覆盖
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.params.retain(|(existing, _)| *existing != name);
        self.params.push((name, value.into()));
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// 通过传输层执行查询
    pub async fn exec(&self, query: &Query, read_only: bool) -> Result<String> {
        self.transport.exec(self, query, read_only).await
    }

    /// 存活探测：发送只读的 SELECT 1 并校验响应载荷
    /// 载荷不符、传输错误或非 2xx 状态都算失败
    pub async fn ping(&self) -> Result<()> {
        let response = self.exec(&Query::new(PING_STMT), true).await?;
        if response.contains(PING_RESPONSE) {
            Ok(())
        } else {
            debug!("ping to {} returned unexpected payload", self.host);
            Err(Error::BadPingResponse(response.trim_end().to_string()))
        }
    }
}

impl fmt::Debug for Conn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("host", &self.host)
            .field("params", &self.params)
            .finish()
    }
}

fn normalize_host(host: &str) -> String {
    let mut host = host.to_string();
    if !host.contains("http://") && !host.contains("https://") {
        host = format!("http://{}", host);
    }
    format!("{}/", host.trim_end_matches('/'))
}
