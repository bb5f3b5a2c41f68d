mod defragmenter;
mod fragment;
mod fragmenter;
#[cfg(test)]
mod tests;

pub use defragmenter::Defragmenter;
pub use fragment::Fragment;
pub use fragmenter::Fragmenter;

use crate::PowerShellRemotingMessage;

/// Outcome of feeding a packet's worth of bytes into a [`Defragmenter`]:
/// either one or more fully reassembled messages, or nothing yet because
/// some fragment of an in-flight object is still outstanding.
#[derive(Debug)]
pub enum DefragmentResult {
    Complete(Vec<PowerShellRemotingMessage>),
    Incomplete,
}
