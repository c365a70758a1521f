//! Node client boundary.
//!
//! The core never builds statement text itself. It hands a typed
//! [`Statement`] to a [`NodeClient`], which owns the connection for exactly
//! one operation and binds the statement's parameters:
//! - [`Statement::sql`] is the template with `?` placeholders
//! - [`Statement::params`] are the values to bind, in order
//!
//! Every failure is reported as a [`NodeError`](crate::NodeError) and is
//! scoped to the node and the call that produced it.

mod row;
mod statement;
pub use row::*;
pub use statement::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Node;
use crate::NodeError;

pub type ClientResult<T> = std::result::Result<T, NodeError>;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

/// Executes statements against one node.
///
/// Implementations acquire a connection per call and release it on every
/// exit path, including failures; no connection outlives the call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// Read statement returning structured rows
    async fn query(
        &self,
        node: &Node,
        statement: &Statement,
    ) -> ClientResult<Vec<Row>>;

    /// Write or control statement, committed before returning
    async fn execute(
        &self,
        node: &Node,
        statement: &Statement,
    ) -> ClientResult<ExecOutcome>;
}
