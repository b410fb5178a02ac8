pub mod mock;

pub use mock::{MockDidResolver, MockDnsResolver, RecordingAuditSink};
