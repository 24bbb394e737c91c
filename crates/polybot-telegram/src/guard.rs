//! Single-flight guard: at most one message in processing per bot instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide busy flag for one bot instance.
///
/// Concurrent chats share the guard, so they serialize. A message arriving
/// while another is in flight is dropped by the caller.
#[derive(Debug, Default)]
pub struct SessionGuard {
    busy: Arc<AtomicBool>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `idle -> busy`. `None` when a message is already in flight.
    pub fn try_acquire(&self) -> Option<SessionPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionPermit {
                hold: Arc::new(Hold {
                    busy: Arc::clone(&self.busy),
                }),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one message.
///
/// Clones share the hold, so work moved onto another thread keeps the guard
/// busy after the handler itself has given up. The guard returns to idle when
/// the last clone drops.
#[derive(Debug, Clone)]
pub struct SessionPermit {
    hold: Arc<Hold>,
}

#[derive(Debug)]
struct Hold {
    busy: Arc<AtomicBool>,
}

impl Drop for Hold {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = SessionGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn released_on_error_path() {
        fn fails(guard: &SessionGuard) -> Result<(), &'static str> {
            let _permit = guard.try_acquire().ok_or("busy")?;
            Err("transform failed")
        }
        let guard = SessionGuard::new();
        assert!(fails(&guard).is_err());
        assert!(!guard.is_busy());
    }

    #[test]
    fn clones_keep_the_guard_busy() {
        let guard = SessionGuard::new();
        let permit = guard.try_acquire().unwrap();
        let moved = permit.clone();
        drop(permit);
        assert!(guard.is_busy());

        let worker = std::thread::spawn(move || drop(moved));
        worker.join().unwrap();
        assert!(!guard.is_busy());
    }

    #[test]
    fn only_one_thread_wins() {
        use std::sync::{Arc, Barrier};

        let guard = Arc::new(SessionGuard::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let permit = guard.try_acquire();
                    let won = permit.is_some();
                    // Hold until everyone has tried.
                    barrier.wait();
                    won
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&w| w)
            .count();
        assert_eq!(winners, 1);
    }
}
