use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Arguments;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::store::args::{placeholders, validate_identifier};
use crate::store::{render_params, Read, Rejection, Row, SqlArg, Store, StoreError};

/// One statement of an atomic multi-statement unit.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

/// PostgreSQL-backed façade. Connections come from a bounded pool and are
/// handed back when each call's future completes or is dropped.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool without connecting; the first call opens a connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "postgres pool configured"
        );

        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs every statement in one transaction: a single commit at the end,
    /// a full rollback on the first failure.
    pub async fn execute_transaction(&self, statements: &[Statement]) -> Result<(), StoreError> {
        let failed = |message: String| StoreError::Procedure {
            name: "transaction".to_string(),
            params: format!("{} statements", statements.len()),
            message,
        };

        let mut tx = self.pool.begin().await.map_err(|err| match classify(&err) {
            Failure::Unavailable(msg) => StoreError::Unavailable(msg),
            _ => failed(err.to_string()),
        })?;

        for statement in statements {
            let args = bind_args(&statement.args).map_err(|err| failed(err.to_string()))?;
            if let Err(err) = sqlx::query_with(&statement.sql, args).execute(&mut *tx).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "transaction rollback failed");
                }
                return Err(failed(format!("{}: {err}", statement.sql)));
            }
        }

        tx.commit().await.map_err(|err| failed(err.to_string()))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn query(&self, read: &Read) -> Result<Vec<Row>, StoreError> {
        let sql = format!("SELECT row_to_json(r) FROM ({}) AS r", read.sql());
        let args = bind_args(&read.params()).map_err(|err| StoreError::Query {
            read: read.name(),
            message: err.to_string(),
        })?;

        let rows: Vec<Json<Row>> = sqlx::query_scalar_with(&sql, args)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| match classify(&err) {
                Failure::Unavailable(msg) => StoreError::Unavailable(msg),
                _ => StoreError::Query {
                    read: read.name(),
                    message: err.to_string(),
                },
            })?;

        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn call_procedure(&self, name: &str, args: &[SqlArg]) -> Result<(), StoreError> {
        validate_identifier(name).map_err(|msg| procedure_failure(name, args, msg))?;

        let sql = format!("CALL {name}({})", placeholders(args));
        let bound = bind_args(args).map_err(|err| procedure_failure(name, args, err.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| procedure_error(name, args, &err))?;

        match sqlx::query_with(&sql, bound).execute(&mut *tx).await {
            Ok(_) => tx
                .commit()
                .await
                .map_err(|err| procedure_error(name, args, &err)),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(procedure = %name, error = %rollback_err, "rollback failed");
                }
                Err(procedure_error(name, args, &err))
            }
        }
    }

    async fn call_function(&self, name: &str, args: &[SqlArg]) -> Result<Option<Value>, StoreError> {
        let failed = |message: String| StoreError::Function {
            name: name.to_string(),
            params: render_params(args),
            message,
        };

        validate_identifier(name).map_err(failed)?;

        let sql = format!("SELECT to_json({name}({}))", placeholders(args));
        let bound = bind_args(args).map_err(|err| failed(err.to_string()))?;

        let value: Option<Option<Json<Value>>> = sqlx::query_scalar_with(&sql, bound)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| match classify(&err) {
                Failure::Unavailable(msg) => StoreError::Unavailable(msg),
                _ => failed(err.to_string()),
            })?;

        Ok(value.flatten().map(|Json(value)| value))
    }
}

fn bind_args(args: &[SqlArg]) -> Result<PgArguments, BoxDynError> {
    let mut bound = PgArguments::default();
    for arg in args {
        match arg {
            SqlArg::Int(v) => bound.add(*v)?,
            SqlArg::Numeric(v) => bound.add(*v)?,
            SqlArg::Text(v) => bound.add(v.clone())?,
            SqlArg::Date(v) => bound.add(*v)?,
            SqlArg::Bool(v) => bound.add(*v)?,
            SqlArg::Null(_) | SqlArg::Out => {}
        }
    }
    Ok(bound)
}

enum Failure {
    Unavailable(String),
    Rejected(Rejection),
    Other(String),
}

fn classify(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|code| code.into_owned()).unwrap_or_default();
            match rejection_for_sqlstate(&code, db.message()) {
                Some(rejection) => Failure::Rejected(rejection),
                None => Failure::Other(format!("[{code}] {}", db.message())),
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Failure::Unavailable(err.to_string()),
        other => Failure::Other(other.to_string()),
    }
}

/// Maps a PostgreSQL SQLSTATE raised inside a procedure to a user-facing
/// rejection. `None` means the failure is internal.
pub fn rejection_for_sqlstate(code: &str, message: &str) -> Option<Rejection> {
    match code {
        // unique_violation, e.g. batch_items.item_id
        "23505" => Some(Rejection::Conflict(
            "the record conflicts with an existing one".to_string(),
        )),
        "23503" => Some(Rejection::NotFound(
            "a referenced record does not exist".to_string(),
        )),
        "23502" | "23514" => Some(Rejection::Invalid(
            "the submitted values violate a store constraint".to_string(),
        )),
        // raise_exception: procedures word these for end users
        "P0001" => Some(Rejection::Conflict(message.to_string())),
        "P0002" => Some(Rejection::NotFound(message.to_string())),
        code if code.starts_with("22") => Some(Rejection::Invalid(
            "a submitted value is malformed or out of range".to_string(),
        )),
        _ => None,
    }
}

fn procedure_failure(name: &str, args: &[SqlArg], message: String) -> StoreError {
    StoreError::Procedure {
        name: name.to_string(),
        params: render_params(args),
        message,
    }
}

fn procedure_error(name: &str, args: &[SqlArg], err: &sqlx::Error) -> StoreError {
    match classify(err) {
        Failure::Unavailable(msg) => StoreError::Unavailable(msg),
        Failure::Rejected(rejection) => StoreError::Rejected {
            name: name.to_string(),
            params: render_params(args),
            rejection,
        },
        Failure::Other(msg) => procedure_failure(name, args, msg),
    }
}
