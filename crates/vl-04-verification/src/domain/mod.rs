pub mod payload;
pub mod verdict;
