use crate::error::{Error, Result};
use crate::value::Value;

pub type Columns = Vec<String>;
pub type Row = Vec<Value>;
pub type Rows = Vec<Row>;

const PLACEHOLDER: &str = ":value:";

/// 外部数据表，随查询一起上传
#[derive(Debug, Clone)]
pub struct External {
    pub name: String,
    pub structure: String,
    pub data: Vec<u8>,
}

/// 一次查询：语句文本、位置参数与附加URL参数
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) stmt: String,
    pub(crate) args: Vec<Value>,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) externals: Vec<External>,
}

impl Query {
    pub fn new(stmt: impl Into<String>) -> Self {
        Self {
            stmt: stmt.into(),
            args: Vec::new(),
            params: Vec::new(),
            externals: Vec::new(),
        }
    }

    pub fn with_args(stmt: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            stmt: stmt.into(),
            args,
            params: Vec::new(),
            externals: Vec::new(),
        }
    }

    /// 绑定一个 :value: 占位参数
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// 附加单次查询的URL参数，如 max_memory_usage
    /// 连接级的常驻参数应设置在 Conn 上
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    /// 合并连接级参数，同名时已有参数优先
    pub fn merge_params(&mut self, params: &[(String, String)]) {
        for (name, value) in params {
            if !self.params.iter().any(|(existing, _)| existing == name) {
                self.params.push((name.clone(), value.clone()));
            }
        }
    }

    /// 附加外部字典数据
    pub fn add_external(
        &mut self,
        name: impl Into<String>,
        structure: impl Into<String>,
        data: Vec<u8>,
    ) {
        self.externals.push(External {
            name: name.into(),
            structure: structure.into(),
            data,
        });
    }

    pub fn stmt(&self) -> &str {
        &self.stmt
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn externals(&self) -> &[External] {
        &self.externals
    }

    /// 将语句中的 :value: 占位符替换为编码后的字面量
    /// 占位符多于参数时，多出的占位符原样保留
    pub fn prepare_body(&self) -> String {
        if self.args.is_empty() {
            return self.stmt.clone();
        }
        let mut out = String::with_capacity(self.stmt.len());
        let mut rest = self.stmt.as_str();
        let mut args = self.args.iter();
        while let Some(pos) = rest.find(PLACEHOLDER) {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(value) => out.push_str(&value.to_literal()),
                None => out.push_str(PLACEHOLDER),
            }
            rest = &rest[pos + PLACEHOLDER.len()..];
        }
        out.push_str(rest);
        out
    }
}

/// 由列与单行构造 INSERT 语句
pub fn build_insert(table: &str, cols: Columns, row: Row) -> Result<Query> {
    build_multi_insert(table, cols, vec![row])
}

/// 由列与多行构造批量 INSERT 语句
pub fn build_multi_insert(table: &str, cols: Columns, rows: Rows) -> Result<Query> {
    if cols.is_empty() || rows.is_empty() {
        return Err(Error::BadInsert("rows and cols cannot be empty".to_string()));
    }

    let col_count = cols.len();
    for row in &rows {
        if row.len() != col_count {
            return Err(Error::BadInsert(
                "amount of row items does not match column count".to_string(),
            ));
        }
    }

    let row_count = rows.len();
    let mut args = Vec::with_capacity(col_count * row_count);
    for row in rows {
        args.extend(row);
    }

    let binds = format!("({})", vec![PLACEHOLDER; col_count].join(","));
    let batch = vec![binds.as_str(); row_count].join(",");
    let stmt = format!("INSERT INTO {} ({}) VALUES {}", table, cols.join(","), batch);

    Ok(Query::with_args(stmt, args))
}
