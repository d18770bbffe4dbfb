pub mod config;
pub mod data_loading;
pub mod error;
pub mod header;
pub mod metrics;
pub mod output;
pub mod records;
pub mod session;
pub mod summary;
pub mod usetime;

#[cfg(test)]
pub(crate) mod test_support;

pub use data_loading::DirectoryData;
pub use error::DecodeError;
pub use header::{FileHeader, Timestamp};
pub use metrics::{Night, Severity};
pub use session::{reconstruct, reconstruct_history, reconstruct_recent};
