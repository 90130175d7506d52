//! Per-thread marker for sampling calls in flight
//!
//! Host callbacks run on the sampling thread with the engine's stack live
//! underneath them. Constructing or destroying prior handles from there is
//! refused.

use caviar_core::{Error, Result};
use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static IN_FLIGHT: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as sampling until dropped
#[derive(Debug)]
pub struct SamplingScope {
    // tied to the thread whose counter it bumped
    _not_send: PhantomData<*const ()>,
}

impl SamplingScope {
    pub fn enter() -> Self {
        IN_FLIGHT.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for SamplingScope {
    fn drop(&mut self) {
        IN_FLIGHT.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Whether a sampling call is running on this thread
pub fn sampling_in_progress() -> bool {
    IN_FLIGHT.with(|depth| depth.get() > 0)
}

/// Fail with `Error::Reentrancy` if a sampling call is running on this thread
pub fn ensure_idle(operation: &str) -> Result<()> {
    if sampling_in_progress() {
        tracing::warn!(operation, "rejected handle lifecycle call during sampling");
        Err(Error::reentrancy(operation))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_nesting() {
        assert!(ensure_idle("construct").is_ok());
        {
            let _outer = SamplingScope::enter();
            {
                let _inner = SamplingScope::enter();
                assert!(sampling_in_progress());
            }
            assert!(matches!(
                ensure_idle("destroy"),
                Err(Error::Reentrancy { .. })
            ));
        }
        assert!(!sampling_in_progress());
    }

    #[test]
    fn test_scope_released_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _scope = SamplingScope::enter();
            panic!("callback blew up");
        });
        assert!(result.is_err());
        assert!(!sampling_in_progress());
    }
}
