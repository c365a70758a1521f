// -
// Server error codes

/// `START GROUP_REPLICATION` issued on a member whose group replication is already running.
pub const ER_GROUP_REPLICATION_RUNNING: u32 = 3093;

/// Group replication cannot start: no reachable group to join.
pub const ER_GROUP_REPLICATION_CONFIGURATION: u32 = 3092;

/// Write rejected because the server runs with `--super-read-only` (not the primary).
pub const ER_OPTION_PREVENTS_STATEMENT: u32 = 1290;

/// Table does not exist.
pub const ER_NO_SUCH_TABLE: u32 = 1146;

// -
// Workload schema

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const PAYLOADS_TABLE: &str = "payloads";

// -
// Workload error buckets

pub const NO_PRIMARY_ERROR: &str = "no_primary";

// -
// Membership table columns

pub(crate) const COL_MEMBER_ID: &str = "MEMBER_ID";
pub(crate) const COL_MEMBER_HOST: &str = "MEMBER_HOST";
pub(crate) const COL_MEMBER_PORT: &str = "MEMBER_PORT";
pub(crate) const COL_MEMBER_STATE: &str = "MEMBER_STATE";
pub(crate) const COL_MEMBER_ROLE: &str = "MEMBER_ROLE";

pub(crate) const COL_COUNT: &str = "count";
pub(crate) const COL_ID: &str = "id";
pub(crate) const COL_PAYLOAD: &str = "payload";
