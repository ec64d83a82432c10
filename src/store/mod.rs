//! Data access façade over the relational store.
//!
//! Business rules live behind the [`Store`] trait: reads go through named
//! views ([`Read`]), state transitions through positional procedure calls
//! ([`procedures`]). Every call acquires its own connection and releases it
//! before returning; nothing spans two calls.

mod args;
mod error;
pub mod instrumented;
pub mod memory;
pub mod postgres;
pub mod procedures;
mod reads;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use args::{render_params, SqlArg, SqlType};
pub use error::{Rejection, StoreError};
pub use instrumented::Instrumented;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use procedures::ProcedureCall;
pub use reads::Read;

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Runs a read-only view query and returns every row.
    async fn query(&self, read: &Read) -> Result<Vec<Row>, StoreError>;

    /// Invokes a procedure; output parameters are passed as [`SqlArg::Out`]
    /// placeholders and their values are not captured.
    async fn call_procedure(&self, name: &str, args: &[SqlArg]) -> Result<(), StoreError>;

    /// Invokes a scalar function, `None` when it yields no row.
    async fn call_function(&self, name: &str, args: &[SqlArg]) -> Result<Option<Value>, StoreError>;

    async fn call(&self, call: &ProcedureCall) -> Result<(), StoreError> {
        self.call_procedure(call.name, &call.args).await
    }

    /// First row of a read, if any.
    async fn query_one(&self, read: &Read) -> Result<Option<Row>, StoreError> {
        Ok(self.query(read).await?.into_iter().next())
    }
}
