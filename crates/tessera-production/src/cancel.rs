use std::panic::{self, UnwindSafe};

/// Unwinding payload used to abort a parse when the cancellation check
/// fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("parsing was cancelled")]
pub struct Cancelled;

impl Cancelled {
    pub(crate) fn throw() -> ! {
        // Unwind without running the panic hook.
        panic::resume_unwind(Box::new(Self))
    }

    /// Runs `f`, turning a cancellation into an error. Other panics keep
    /// unwinding.
    pub fn catch<F, T>(f: F) -> Result<T, Self>
    where
        F: FnOnce() -> T + UnwindSafe,
    {
        match panic::catch_unwind(f) {
            Ok(value) => Ok(value),
            Err(payload) => match payload.downcast::<Self>() {
                Ok(cancelled) => Err(*cancelled),
                Err(payload) => panic::resume_unwind(payload),
            },
        }
    }
}
