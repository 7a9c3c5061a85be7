use thiserror::Error;

// 定义客户端错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP请求失败： {0}")]
    Transport(#[from] reqwest::Error),
    #[error("上游返回错误： 状态码 {status}: {body}")]
    Http { status: u16, body: String },
    #[error("数据库返回错误： {0}")]
    Server(String),
    #[error("Ping响应异常： 收到 '{0}', 期望 '1'")]
    BadPingResponse(String),
    #[error("字段解析失败： '{field}' 无法解析为 {target}")]
    Decode { field: String, target: &'static str },
    #[error("响应行缺少第 {0} 列")]
    MissingColumn(usize),
    #[error("JSON解析失败： {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("插入语句构造失败： {0}")]
    BadInsert(String),
}

pub type Result<T> = std::result::Result<T, Error>;
