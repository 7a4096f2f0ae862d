//! Listen/accept restart bookkeeping
//!
//! Blocking `accept` participates in a restart protocol: the waiter
//! registers before the host call and deregisters after, so that a
//! signal arriving mid-wait can be retried transparently when policy
//! says so. Policy is process-global and flipped by the embedder's
//! signal handling.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use lazy_static::lazy_static;
use spin::Mutex;

use crate::fs::FileDesc;

/// Per-descriptor state consumed by this module.
#[derive(Debug, Default, Clone, Copy)]
pub struct SockRestart {
    /// Protocol number recorded at socket creation.
    pub proto: i32,
    /// Whether this descriptor has entered the listening state.
    pub listening: bool,
}

static RESTART_POLICY: AtomicBool = AtomicBool::new(false);

lazy_static! {
    // Host fds currently blocked in an accept wait.
    static ref LISTEN_WAITS: Mutex<BTreeSet<libc::c_int>> = Mutex::new(BTreeSet::new());
}

/// Set whether interrupted accept waits should be retried.
pub fn set_restart_policy(restart: bool) {
    RESTART_POLICY.store(restart, Ordering::Relaxed);
}

/// Record that `listen` succeeded on this descriptor.
pub fn begin_listen(fd: &FileDesc) {
    fd.restart.lock().listening = true;
}

/// Forget a listening descriptor; called from the socket close path
/// before the host fd goes away.
pub fn end_listen(fd: &FileDesc) {
    fd.restart.lock().listening = false;
    LISTEN_WAITS.lock().remove(&fd.real_fd);
}

/// Enter an accept wait on this descriptor.
pub fn begin_listen_wait(fd: &FileDesc) {
    LISTEN_WAITS.lock().insert(fd.real_fd);
}

/// Leave an accept wait.
pub fn end_listen_wait(fd: &FileDesc) {
    LISTEN_WAITS.lock().remove(&fd.real_fd);
}

/// Whether an `EINTR` from an accept wait should re-enter the wait.
pub fn should_restart_listen_wait() -> bool {
    RESTART_POLICY.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileDesc, REALFS};

    #[test]
    fn test_listen_state_tracks_descriptor() {
        let desc = FileDesc::new(&REALFS, -1, 0);
        assert!(!desc.restart.lock().listening);
        begin_listen(&desc);
        assert!(desc.restart.lock().listening);
        end_listen(&desc);
        assert!(!desc.restart.lock().listening);
    }

    #[test]
    fn test_policy_toggle() {
        set_restart_policy(true);
        assert!(should_restart_listen_wait());
        set_restart_policy(false);
        assert!(!should_restart_listen_wait());
    }
}
