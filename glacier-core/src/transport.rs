use crate::conn::Conn;
use crate::error::{Error, Result};
use crate::query::Query;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

const BODY_CONTENT_TYPE: &str = "text/plain";

// 连接间共享同一个 reqwest 客户端复用连接池
static SHARED_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// 传输层：对单个主机执行一条查询并返回原始响应文本
/// 超时等传输细节都在这一层，集群核心不感知
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exec(&self, conn: &Conn, query: &Query, read_only: bool) -> Result<String>;
}

/// 基于 reqwest 的 HTTP 传输
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// 指定单次请求超时
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exec(&self, conn: &Conn, query: &Query, read_only: bool) -> Result<String> {
        let body = query.prepare_body();

        if read_only {
            let mut pairs = vec![("query".to_string(), body)];
            pairs.extend(merged_params(query, conn));
            let url = format!("{}?{}", conn.host(), encode_pairs(&pairs));
            return self.send(SHARED_CLIENT.get(url)).await;
        }

        if query.externals().is_empty() {
            let url = format!(
                "{}?{}",
                conn.host(),
                encode_pairs(&merged_params(query, conn))
            );
            let builder = SHARED_CLIENT
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, BODY_CONTENT_TYPE)
                .body(body);
            return self.send(builder).await;
        }

        // 带外部数据表的查询走 multipart:语句与表结构进URL,数据作为文件部分
        let mut pairs = vec![("query".to_string(), body)];
        let mut form = reqwest::multipart::Form::new();
        for external in query.externals() {
            pairs.push((
                format!("{}_structure", external.name),
                external.structure.clone(),
            ));
            let part = reqwest::multipart::Part::bytes(external.data.clone())
                .file_name(external.name.clone());
            form = form.part(external.name.clone(), part);
        }
        pairs.extend(merged_params(query, conn));
        let url = format!("{}?{}", conn.host(), encode_pairs(&pairs));
        self.send(SHARED_CLIENT.post(url).multipart(form)).await
    }
}

/// 单次查询参数与连接级参数合并，同名时查询参数优先
fn merged_params(query: &Query, conn: &Conn) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = query.params().to_vec();
    for (name, value) in conn.params() {
        if !merged.iter().any(|(existing, _)| existing == name) {
            merged.push((name.clone(), value.clone()));
        }
    }
    merged
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}
