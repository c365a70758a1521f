use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::constants::COL_COUNT;
use crate::constants::COL_ID;
use crate::constants::COL_MEMBER_HOST;
use crate::constants::COL_MEMBER_ID;
use crate::constants::COL_MEMBER_PORT;
use crate::constants::COL_MEMBER_ROLE;
use crate::constants::COL_MEMBER_STATE;
use crate::constants::COL_PAYLOAD;
use crate::constants::ER_GROUP_REPLICATION_CONFIGURATION;
use crate::constants::ER_GROUP_REPLICATION_RUNNING;
use crate::constants::ER_NO_SUCH_TABLE;
use crate::constants::ER_OPTION_PREVENTS_STATEMENT;
use crate::ClientResult;
use crate::ExecOutcome;
use crate::MemberRole;
use crate::MemberState;
use crate::Node;
use crate::NodeError;
use crate::Row;
use crate::Table;
use crate::TransactionRecord;

/// Workload tables held by one member.
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    transactions: BTreeMap<u64, TransactionRecord>,
    payloads: BTreeMap<u64, Vec<u8>>,
    next_transaction_id: u64,
    next_payload_id: u64,
}

impl Tables {
    fn count(
        &self,
        table: Table,
    ) -> u64 {
        match table {
            Table::Transactions => self.transactions.len() as u64,
            Table::Payloads => self.payloads.len() as u64,
        }
    }
}

#[derive(Debug)]
pub(super) struct SimNode {
    pub(super) node: Node,
    pub(super) running: bool,
    pub(super) reachable: bool,
    pub(super) in_group: bool,
    pub(super) recovering_until: Option<Instant>,
    pub(super) tables: Option<Tables>,
}

impl SimNode {
    fn accepts_connections(&self) -> bool {
        self.running && self.reachable
    }

    fn member_state(
        &self,
        now: Instant,
    ) -> MemberState {
        match self.recovering_until {
            Some(until) if until > now => MemberState::Recovering,
            _ => MemberState::Online,
        }
    }
}

/// Single-primary replication group.
///
/// Time is passed in explicitly; [`SimState::tick`] applies whatever
/// elections and recoveries are due at `now`.
#[derive(Debug)]
pub(super) struct SimState {
    pub(super) nodes: Vec<SimNode>,
    pub(super) primary: Option<usize>,
    /// Ex-primary still listed as UNREACHABLE until the election ends
    expelled: Option<usize>,
    election_due: Option<Instant>,
    election_delay: Duration,
    recovery_delay: Duration,
}

impl SimState {
    /// All members running and ONLINE, the first one primary, no schema.
    pub(super) fn new(
        nodes: &[Node],
        election_delay: Duration,
        recovery_delay: Duration,
    ) -> Self {
        Self {
            nodes: nodes
                .iter()
                .map(|node| SimNode {
                    node: node.clone(),
                    running: true,
                    reachable: true,
                    in_group: true,
                    recovering_until: None,
                    tables: None,
                })
                .collect(),
            primary: if nodes.is_empty() { None } else { Some(0) },
            expelled: None,
            election_due: None,
            election_delay,
            recovery_delay,
        }
    }

    pub(super) fn index_of(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.nodes.iter().position(|n| n.node.name == name)
    }

    pub(super) fn tick(
        &mut self,
        now: Instant,
    ) {
        for n in &mut self.nodes {
            if matches!(n.recovering_until, Some(until) if until <= now) {
                n.recovering_until = None;
            }
        }

        if self.primary.is_none() && matches!(self.election_due, Some(due) if due <= now) {
            self.election_due = None;
            self.expelled = None;
            self.primary = self
                .nodes
                .iter()
                .position(|n| n.running && n.in_group && n.recovering_until.is_none());
            match self.primary {
                Some(i) => info!(primary = %self.nodes[i].node.name, "simulated group elected a new primary"),
                None => info!("simulated group has no member left to elect"),
            }
        }
    }

    /// Opens a connection to member `i`.
    pub(super) fn connect(
        &self,
        i: usize,
    ) -> ClientResult<()> {
        let n = &self.nodes[i];
        if n.accepts_connections() {
            Ok(())
        } else {
            Err(NodeError::connect(&n.node.name, "Can't connect to server"))
        }
    }

    /// Membership table as seen from member `i`.
    pub(super) fn group_members(
        &self,
        i: usize,
        now: Instant,
    ) -> Vec<Row> {
        let me = &self.nodes[i];
        if !me.in_group {
            return vec![member_row(&me.node, MemberState::Offline, MemberRole::Secondary)];
        }

        let mut rows: Vec<Row> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.in_group)
            .map(|(j, n)| {
                let role = if self.primary == Some(j) {
                    MemberRole::Primary
                } else {
                    MemberRole::Secondary
                };
                member_row(&n.node, n.member_state(now), role)
            })
            .collect();

        if let Some(j) = self.expelled {
            rows.push(member_row(
                &self.nodes[j].node,
                MemberState::Unreachable,
                MemberRole::Secondary,
            ));
        }
        rows
    }

    fn require_primary(
        &self,
        i: usize,
    ) -> ClientResult<()> {
        if self.primary == Some(i) {
            Ok(())
        } else {
            Err(NodeError::query(
                &self.nodes[i].node.name,
                Some(ER_OPTION_PREVENTS_STATEMENT),
                "The MySQL server is running with the --super-read-only option so it cannot execute this statement",
            ))
        }
    }

    fn tables(
        &self,
        i: usize,
        table: Table,
    ) -> ClientResult<&Tables> {
        self.nodes[i].tables.as_ref().ok_or_else(|| no_such_table(&self.nodes[i].node.name, table))
    }

    /// Drops and recreates the workload tables on every group member.
    pub(super) fn provision_schema(
        &mut self,
        i: usize,
    ) -> ClientResult<ExecOutcome> {
        self.require_primary(i)?;
        for n in self.nodes.iter_mut().filter(|n| n.in_group) {
            n.tables = Some(Tables::default());
        }
        Ok(ExecOutcome::default())
    }

    pub(super) fn insert_transaction(
        &mut self,
        i: usize,
        record: &TransactionRecord,
    ) -> ClientResult<ExecOutcome> {
        self.require_primary(i)?;
        let id = self.tables(i, Table::Transactions)?.next_transaction_id + 1;
        self.replicate(|t| {
            t.next_transaction_id = id;
            t.transactions.insert(id, record.clone());
        });
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: Some(id),
        })
    }

    pub(super) fn insert_payload(
        &mut self,
        i: usize,
        payload: &[u8],
    ) -> ClientResult<ExecOutcome> {
        self.require_primary(i)?;
        let id = self.tables(i, Table::Payloads)?.next_payload_id + 1;
        self.replicate(|t| {
            t.next_payload_id = id;
            t.payloads.insert(id, payload.to_vec());
        });
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: Some(id),
        })
    }

    /// Applies a committed change to every group member holding the schema.
    fn replicate(
        &mut self,
        apply: impl Fn(&mut Tables),
    ) {
        for n in self.nodes.iter_mut().filter(|n| n.in_group) {
            if let Some(tables) = n.tables.as_mut() {
                apply(tables);
            }
        }
    }

    pub(super) fn count_rows(
        &self,
        i: usize,
        table: Table,
    ) -> ClientResult<Vec<Row>> {
        let count = self.tables(i, table)?.count(table);
        Ok(vec![Row::new().with(COL_COUNT, count)])
    }

    pub(super) fn read_payload(
        &self,
        i: usize,
        id: u64,
    ) -> ClientResult<Vec<Row>> {
        let tables = self.tables(i, Table::Payloads)?;
        Ok(tables
            .payloads
            .get(&id)
            .map(|p| vec![Row::new().with(COL_ID, id).with(COL_PAYLOAD, p.clone())])
            .unwrap_or_default())
    }

    /// `START GROUP_REPLICATION` on member `i`.
    pub(super) fn join(
        &mut self,
        i: usize,
        now: Instant,
    ) -> ClientResult<ExecOutcome> {
        let name = self.nodes[i].node.name.clone();
        if self.nodes[i].in_group {
            return Err(NodeError::query(
                name,
                Some(ER_GROUP_REPLICATION_RUNNING),
                "The START GROUP_REPLICATION command failed since the group is already running",
            ));
        }
        let Some(p) = self.primary else {
            return Err(NodeError::query(
                name,
                Some(ER_GROUP_REPLICATION_CONFIGURATION),
                "The server is not configured properly to be an active member of the group",
            ));
        };

        // Distributed recovery: take the donor's data as of now
        let donor = self.nodes[p].tables.clone();
        let recovery_delay = self.recovery_delay;
        let n = &mut self.nodes[i];
        n.tables = donor;
        n.in_group = true;
        n.recovering_until = Some(now + recovery_delay);
        if self.expelled == Some(i) {
            self.expelled = None;
        }
        info!(node = %name, "member joined the simulated group");
        Ok(ExecOutcome::default())
    }

    /// Flips one stored byte of payload `id` on member `i` only.
    pub(super) fn corrupt_payload(
        &mut self,
        i: usize,
        id: u64,
        byte_index: usize,
    ) -> bool {
        let Some(byte) = self.nodes[i]
            .tables
            .as_mut()
            .and_then(|t| t.payloads.get_mut(&id))
            .and_then(|p| p.get_mut(byte_index))
        else {
            return false;
        };
        *byte ^= 0x20;
        true
    }

    /// Returns false when the member was already stopped.
    pub(super) fn stop(
        &mut self,
        i: usize,
        now: Instant,
    ) -> bool {
        let n = &mut self.nodes[i];
        if !n.running {
            return false;
        }
        n.running = false;
        n.in_group = false;
        n.recovering_until = None;

        if self.primary == Some(i) {
            self.primary = None;
            self.expelled = Some(i);
            self.election_due = Some(now + self.election_delay);
        }
        true
    }

    /// Returns false when the member was already running.
    pub(super) fn start(
        &mut self,
        i: usize,
    ) -> bool {
        let n = &mut self.nodes[i];
        if n.running {
            return false;
        }
        n.running = true;
        true
    }
}

fn member_row(
    node: &Node,
    state: MemberState,
    role: MemberRole,
) -> Row {
    Row::new()
        .with(COL_MEMBER_ID, format!("{}-uuid", node.handle))
        .with(COL_MEMBER_HOST, node.handle.as_str())
        .with(COL_MEMBER_PORT, node.port as u64)
        .with(COL_MEMBER_STATE, state.as_str())
        .with(COL_MEMBER_ROLE, role.as_str())
}

fn no_such_table(
    node: &str,
    table: Table,
) -> NodeError {
    NodeError::query(node, Some(ER_NO_SUCH_TABLE), format!("Table '{table}' doesn't exist"))
}
