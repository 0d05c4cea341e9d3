mod rollover;

pub use rollover::RolloverError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
