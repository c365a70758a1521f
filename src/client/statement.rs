use std::fmt;

use crate::constants::PAYLOADS_TABLE;
use crate::constants::TRANSACTIONS_TABLE;
use crate::Value;

/// Tables owned by the drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Transactions,
    Payloads,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Transactions => TRANSACTIONS_TABLE,
            Table::Payloads => PAYLOADS_TABLE,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One workload write.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Wall-clock milliseconds since the epoch
    pub transaction_time_ms: u64,
    pub amount: u64,
    pub description: String,
}

impl TransactionRecord {
    /// Record for the `attempt`-th write of a run.
    pub fn for_attempt(
        attempt: u64,
        transaction_time_ms: u64,
    ) -> Self {
        Self {
            transaction_time_ms,
            amount: 100 + (attempt % 900),
            description: format!("Transaction #{attempt}"),
        }
    }
}

/// Every statement the drill issues. Values travel as bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Group membership of the answering node's view
    GroupMembers,
    /// Drop-and-recreate the workload tables
    ProvisionSchema,
    InsertTransaction(TransactionRecord),
    InsertPayload { payload: Vec<u8> },
    CountRows { table: Table },
    ReadPayload { id: u64 },
    StartGroupReplication,
}

impl Statement {
    /// Statement template; `?` marks a bound parameter.
    pub fn sql(&self) -> &'static str {
        match self {
            Statement::GroupMembers => {
                "SELECT MEMBER_ID, MEMBER_HOST, MEMBER_PORT, MEMBER_STATE, MEMBER_ROLE \
                 FROM performance_schema.replication_group_members \
                 ORDER BY MEMBER_ROLE DESC, MEMBER_PORT"
            }
            Statement::ProvisionSchema => {
                "DROP TABLE IF EXISTS transactions, payloads; \
                 CREATE TABLE transactions (\
                 id INT AUTO_INCREMENT PRIMARY KEY, \
                 transaction_time DATETIME(3), \
                 amount DECIMAL(10,2), \
                 description VARCHAR(255), \
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
                 INDEX idx_time (transaction_time)) ENGINE=InnoDB; \
                 CREATE TABLE payloads (\
                 id INT AUTO_INCREMENT PRIMARY KEY, \
                 payload LONGBLOB NOT NULL, \
                 created_at TIMESTAMP(3) DEFAULT CURRENT_TIMESTAMP(3)) ENGINE=InnoDB"
            }
            Statement::InsertTransaction(_) => {
                "INSERT INTO transactions (transaction_time, amount, description) \
                 VALUES (FROM_UNIXTIME(? / 1000), ?, ?)"
            }
            Statement::InsertPayload { .. } => "INSERT INTO payloads (payload) VALUES (?)",
            Statement::CountRows { table: Table::Transactions } => {
                "SELECT COUNT(*) AS count FROM transactions"
            }
            Statement::CountRows { table: Table::Payloads } => {
                "SELECT COUNT(*) AS count FROM payloads"
            }
            Statement::ReadPayload { .. } => "SELECT id, payload FROM payloads WHERE id = ?",
            Statement::StartGroupReplication => "START GROUP_REPLICATION",
        }
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        match self {
            Statement::InsertTransaction(record) => vec![
                Value::from(record.transaction_time_ms),
                Value::from(record.amount),
                Value::from(record.description.as_str()),
            ],
            Statement::InsertPayload { payload } => vec![Value::Bytes(payload.clone())],
            Statement::ReadPayload { id } => vec![Value::from(*id)],
            _ => Vec::new(),
        }
    }

    /// Short label for logs; never includes parameter values.
    pub fn label(&self) -> &'static str {
        match self {
            Statement::GroupMembers => "group_members",
            Statement::ProvisionSchema => "provision_schema",
            Statement::InsertTransaction(_) => "insert_transaction",
            Statement::InsertPayload { .. } => "insert_payload",
            Statement::CountRows { .. } => "count_rows",
            Statement::ReadPayload { .. } => "read_payload",
            Statement::StartGroupReplication => "start_group_replication",
        }
    }
}
