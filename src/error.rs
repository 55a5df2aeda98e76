use thiserror::Error;

/// Errors reported by channel creation. Nothing else in the crate fails:
/// queue saturation and missing instruments are absorbed and logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel index {index} out of range (max {max})")]
    IndexOutOfRange { index: usize, max: usize },
    #[error("could not allocate {count} channels")]
    OutOfMemory { count: usize },
}
