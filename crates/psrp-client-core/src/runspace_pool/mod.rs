pub mod creator;
pub mod discovery;
pub mod enums;
pub mod expect_shell_created;
pub mod pool;
pub mod types;

pub use creator::RunspacePoolCreator;
pub use discovery::{DiscoveredRunspacePool, get_runspace_pools};
pub use enums::{PowerShellState, PsInvocationState, RunspacePoolState};
pub use expect_shell_created::{CreateOutcome, ExpectShellCreated};
pub use pool::{DesiredStream, PROTOCOL_VERSION_FALLBACK, RunspacePool};
pub use types::{PipelineRepresentation, Runspace};
