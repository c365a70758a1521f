mod election_timeout_test;
mod failover_test;
mod payload_test;
