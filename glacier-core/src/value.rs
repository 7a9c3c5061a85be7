use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// 查询参数值
/// 覆盖文本协议支持的字面量类型
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Array(Vec<Value>),
}

impl Value {
    /// 编码为语句中的字面量
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(s) => quote(s),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_literal).collect();
                format!("[{}]", inner.join(","))
            }
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

macro_rules! impl_value_from_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::UInt(v as u64)
                }
            }
        )*
    };
}

impl_value_from_int!(i8, i16, i32, i64);
impl_value_from_uint!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Array(v.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::Array(v.into_iter().map(Value::from).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// 从 TSV 字段解析出类型化的值
pub trait FromField: Sized {
    fn from_field(field: &str) -> Result<Self>;
}

macro_rules! impl_from_field_parse {
    ($($t:ty),*) => {
        $(
            impl FromField for $t {
                fn from_field(field: &str) -> Result<Self> {
                    field.parse::<$t>().map_err(|_| Error::Decode {
                        field: field.to_string(),
                        target: stringify!($t),
                    })
                }
            }
        )*
    };
}

impl_from_field_parse!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl FromField for bool {
    fn from_field(field: &str) -> Result<Self> {
        match field {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(Error::Decode {
                field: field.to_string(),
                target: "bool",
            }),
        }
    }
}

impl FromField for String {
    fn from_field(field: &str) -> Result<Self> {
        Ok(unescape(field))
    }
}

impl FromField for NaiveDate {
    fn from_field(field: &str) -> Result<Self> {
        NaiveDate::parse_from_str(field, "%Y-%m-%d").map_err(|_| Error::Decode {
            field: field.to_string(),
            target: "NaiveDate",
        })
    }
}

impl FromField for NaiveDateTime {
    fn from_field(field: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(field, "%Y-%m-%d %H:%M:%S").map_err(|_| Error::Decode {
            field: field.to_string(),
            target: "NaiveDateTime",
        })
    }
}

// TSV 中 NULL 编码为 \N
impl<T: FromField> FromField for Option<T> {
    fn from_field(field: &str) -> Result<Self> {
        if field == "\\N" {
            Ok(None)
        } else {
            T::from_field(field).map(Some)
        }
    }
}

/// 还原 TSV 字段中的转义序列
pub fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
