pub mod guest;
pub mod ops;
pub mod renderer;

pub use guest::GuestTerm;
pub use ops::TerminalOp;
pub use renderer::{CrosstermRenderer, HostRenderer};
