//! Application services — the operations the collaborating server layer
//! calls. All I/O is routed through injected port traits and the staging
//! primitives in `crate::infra`.

pub mod cleanup;
pub mod exchange;
pub mod install;
pub mod invoke;
pub mod payload;

pub use cleanup::remove_package;
pub use exchange::{receive_messages, send_message};
pub use install::install_package;
pub use invoke::{BUILD_SCRIPT, BuildTarget};
pub use payload::build_payload;
