use crate::conn::Conn;
use crate::error::{Error, Result};
use crate::query::Query;
use crate::value::FromField;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// 识别响应体中的数据库错误
/// 服务端可能以 2xx 状态返回 "Code: NNN ... DB::Exception: ..." 文本
pub fn error_from_response(body: &str) -> Result<()> {
    let head = body.trim_start();
    if head.starts_with("Code:") || head.contains("DB::Exception") {
        let line = head.lines().next().unwrap_or_default();
        return Err(Error::Server(line.to_string()));
    }
    Ok(())
}

/// TSV 响应的行迭代器
/// 协议没有服务端游标，整个响应已经在内存里，迭代只是逐行切分
#[derive(Debug)]
pub struct Iter {
    text: String,
    pos: usize,
}

impl Iter {
    pub(crate) fn new(text: String) -> Self {
        Self { text, pos: 0 }
    }

    /// 未消费部分的字节数
    pub fn len(&self) -> usize {
        self.text.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取下一行；空行视为数据结束
    pub fn next_row(&mut self) -> Option<TextRow> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let line = match rest.find('\n') {
            Some(idx) => {
                self.pos += idx + 1;
                &rest[..idx]
            }
            None => {
                self.pos = self.text.len();
                rest
            }
        };
        if line.is_empty() {
            return None;
        }
        Some(TextRow {
            line: line.to_string(),
        })
    }
}

impl Iterator for Iter {
    type Item = TextRow;

    fn next(&mut self) -> Option<TextRow> {
        self.next_row()
    }
}

/// 一行 TSV 数据
#[derive(Debug, Clone)]
pub struct TextRow {
    line: String,
}

impl TextRow {
    /// 解码第 idx 列
    pub fn column<T: FromField>(&self, idx: usize) -> Result<T> {
        let field = self
            .line
            .split('\t')
            .nth(idx)
            .ok_or(Error::MissingColumn(idx))?;
        T::from_field(field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.line.split('\t')
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl Query {
    /// 执行语句，只检查服务端是否报错
    pub async fn exec(&self, conn: &Conn) -> Result<()> {
        let response = conn.exec(self, false).await?;
        error_from_response(&response)
    }

    /// 执行查询并迭代 TSV 结果
    pub async fn iter(&self, conn: &Conn) -> Result<Iter> {
        let response = conn.exec(self, false).await?;
        error_from_response(&response)?;
        Ok(Iter::new(response))
    }

    /// 以 FORMAT JSON 执行并把 data 字段反序列化到目标类型
    pub async fn fetch<T: DeserializeOwned>(&self, conn: &Conn) -> Result<T> {
        #[derive(Deserialize)]
        struct Envelope<T> {
            data: T,
        }

        let mut query = self.clone();
        query.stmt = format!("{} FORMAT JSON", self.stmt);
        let response = conn.exec(&query, false).await?;
        error_from_response(&response)?;
        let envelope: Envelope<T> = serde_json::from_str(&response)?;
        Ok(envelope.data)
    }
}
