pub mod fixtures;
pub mod job_lifecycle;
pub mod nonce_sequencing;
pub mod reconciliation;
pub mod verification_flows;
