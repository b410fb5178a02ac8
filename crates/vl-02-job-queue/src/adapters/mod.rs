pub mod memory;

pub use memory::InMemoryBroker;
