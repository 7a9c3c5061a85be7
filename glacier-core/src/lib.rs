//! Glacier Core Library
//!
//! This library provides the stateless layers of the Glacier ClickHouse
//! client:
//! - Connection handles and liveness probing
//! - Query construction and parameter encoding
//! - HTTP transport over the text protocol
//! - Response parsing and row decoding
//! - Configuration loading

pub mod config;
pub mod conn;
pub mod error;
pub mod query;
pub mod response;
pub mod transport;
pub mod value;

// Re-export commonly used types
pub use config::{load_config, load_config_from_path, ClusterConfig};
pub use conn::Conn;
pub use error::{Error, Result};
pub use query::{build_insert, build_multi_insert, Columns, External, Query, Row, Rows};
pub use response::{error_from_response, Iter, TextRow};
pub use transport::{HttpTransport, Transport};
pub use value::{FromField, Value};
