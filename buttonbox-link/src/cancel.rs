//! Hierarchical cancellation shared between threads.

use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::{Duration, Instant};

struct Node {
    cancelled: Mutex<bool>,
    cond: Condvar,
    children: Mutex<Vec<Weak<Node>>>,
}

impl Node {
    fn new() -> Self {
        Node {
            cancelled: Mutex::new(false),
            cond: Condvar::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.lock().map(|c| *c).unwrap_or(true)
    }

    fn cancel(&self) {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            if *cancelled {
                return;
            }
            *cancelled = true;
            self.cond.notify_all();
        }
        let children = match self.children.lock() {
            Ok(mut children) => std::mem::take(&mut *children),
            Err(_) => return,
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// Cancellation signal observed cooperatively at blocking points.
///
/// Cancelling a token cancels every child created from it. Cancelling a
/// child never affects its parent or its siblings. Clones share the same
/// signal.
#[derive(Clone)]
pub struct CancelToken {
    node: Arc<Node>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken {
            node: Arc::new(Node::new()),
        }
    }

    /// Create a token that is cancelled together with this one
    pub fn child(&self) -> CancelToken {
        let child = CancelToken::new();
        if let Ok(mut children) = self.node.children.lock() {
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child.node));
        }
        // A parent cancelled before the child registered still reaches it
        if self.is_cancelled() {
            child.cancel();
        }
        child
    }

    pub fn cancel(&self) {
        self.node.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }

    /// Sleep for `timeout` or until cancelled, whichever comes first.
    /// Returns true if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = match self.node.cancelled.lock() {
            Ok(c) => c,
            Err(_) => return true,
        };
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.node.cond.wait_timeout(cancelled, deadline - now) {
                Ok((c, _)) => c,
                Err(_) => return true,
            };
        }
        true
    }

    /// Block until cancelled
    pub fn wait(&self) {
        let mut cancelled = match self.node.cancelled.lock() {
            Ok(c) => c,
            Err(_) => return,
        };
        while !*cancelled {
            cancelled = match self.node.cond.wait(cancelled) {
                Ok(c) => c,
                Err(_) => return,
            };
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_parent_cancels_children() {
        let parent = CancelToken::new();
        let a = parent.child();
        let b = a.child();
        parent.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_child_does_not_cancel_parent_or_sibling() {
        let parent = CancelToken::new();
        let a = parent.child();
        let b = parent.child();
        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = CancelToken::new();
        parent.cancel();
        assert!(parent.child().is_cancelled());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let parent = CancelToken::new();
        let child = parent.child();
        let waiter = thread::spawn(move || child.wait_timeout(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        parent.cancel();
        assert!(waiter.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
