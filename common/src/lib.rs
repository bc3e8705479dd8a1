use arrow::error::ArrowError;
use aws_smithy_runtime_api::client::result::CreateUnhandledError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use datafusion::error::DataFusionError;
use thiserror::Error;

pub mod config;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Warehouse error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Load into {table} failed: {message}")]
    Load { table: String, message: String },

    #[error("{label} failed: {source}")]
    Statement {
        label: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Table {table} has {duplicates} duplicated values of {column}")]
    DuplicateKey {
        table: String,
        column: String,
        duplicates: i64,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid Uri: {0}")]
    InvalidUri(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attaches the label of the statement that produced this error.
    pub fn in_statement(self, label: impl Into<String>) -> Self {
        Error::Statement {
            label: label.into(),
            source: Box::new(self),
        }
    }

    pub fn load(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Load {
            table: table.into(),
            message: message.into(),
        }
    }
}

impl<E: std::fmt::Debug + CreateUnhandledError> From<SdkError<E, Response>> for Error {
    fn from(err: SdkError<E, Response>) -> Self {
        Error::AwsSdk(format!("{:?}", err))
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::Storage(format!("Object store error: {}", err))
    }
}

impl From<object_store::path::Error> for Error {
    fn from(err: object_store::path::Error) -> Self {
        Error::InvalidUri(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_error_keeps_native_message() {
        let native = Error::Other("relation \"staging_events\" does not exist".to_string());
        let wrapped = native.in_statement("insert songplays");

        assert_eq!(
            wrapped.to_string(),
            "insert songplays failed: relation \"staging_events\" does not exist"
        );
    }

    #[test]
    fn test_load_error_names_table() {
        let err = Error::load("staging_songs", "line 3: expected value");
        assert_eq!(
            err.to_string(),
            "Load into staging_songs failed: line 3: expected value"
        );
    }
}
