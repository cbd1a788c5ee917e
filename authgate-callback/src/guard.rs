//! Re-entrancy guard for one callback instance.

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds the processing flag for as long as it lives.
///
/// The flag is cleared when the guard is dropped, whichever way the
/// attempt ends.
#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    /// Set `flag`, or return `None` if it is already set.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_drop() {
        let flag = AtomicBool::new(false);

        let guard = ProcessingGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(ProcessingGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(ProcessingGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_released_on_early_return() {
        fn attempt(flag: &AtomicBool) -> Result<(), &'static str> {
            let _guard = ProcessingGuard::acquire(flag).ok_or("busy")?;
            Err("exchange failed")
        }

        let flag = AtomicBool::new(false);
        assert_eq!(attempt(&flag), Err("exchange failed"));
        assert!(!flag.load(Ordering::Acquire));
    }
}
