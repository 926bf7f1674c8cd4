//! Infrastructure layer — production implementations of the application
//! ports plus the filesystem mechanics the services are built on.

pub mod bundle;
pub mod command_runner;
pub mod contract;
pub mod memory;
pub mod staging;

pub use command_runner::TokioCommandRunner;
pub use memory::{
    MemoryEndpointStore, MemoryLogStore, MemoryMessageStore, MemoryPackageStore, MemoryStores,
};
pub use staging::{StagedDir, stage};
