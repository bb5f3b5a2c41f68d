pub mod commandline;
pub mod receive;
pub mod rsp;
pub mod send;
pub mod signal;

pub use commandline::CommandLineValue;
pub use receive::{CommandStateValue, ReceiveResponseValue, ReceiveValue, StreamValue};
pub use rsp::ShellValue;
pub use send::SendValue;
pub use signal::{SIGNAL_CODE_CTRL_C, SIGNAL_CODE_TERMINATE, SignalValue};
