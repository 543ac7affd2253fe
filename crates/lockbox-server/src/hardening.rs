//! Process hardening: core dump prevention and memory pinning.
//!
//! Master passwords, derived keys, and decrypted records pass through this
//! process's memory on every request. On Unix, core dumps are disabled and
//! all pages are locked so none of that lands on disk. Both steps are no-ops
//! on other platforms. Failures are reported, never fatal.

use std::io;

/// A hardening step that could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum HardeningError {
    #[error("failed to disable core dumps: {0}")]
    CoreDumps(#[source] io::Error),

    #[error("failed to lock memory: {0} (set LOCKBOX_DISABLE_MLOCK=true for dev)")]
    MemoryLock(#[source] io::Error),

    #[error("mlock disabled via LOCKBOX_DISABLE_MLOCK: secrets may be swapped to disk")]
    MemoryLockDisabled,
}

/// Apply every hardening step and collect what could not be applied.
///
/// Runs before logging is initialized; the caller logs the returned list.
#[must_use]
pub fn apply(disable_mlock: bool) -> Vec<HardeningError> {
    let mut problems = Vec::new();

    if let Err(e) = disable_core_dumps() {
        problems.push(HardeningError::CoreDumps(e));
    }

    if disable_mlock {
        problems.push(HardeningError::MemoryLockDisabled);
    } else if let Err(e) = lock_memory() {
        problems.push(HardeningError::MemoryLock(e));
    }

    problems
}

/// Set `RLIMIT_CORE` to 0.
///
/// # Errors
///
/// Returns the OS error if `setrlimit` fails.
#[cfg(unix)]
pub fn disable_core_dumps() -> io::Result<()> {
    let rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `setrlimit` only reads the valid, fully initialized `rlimit`
    // passed by reference and touches no other memory.
    #[allow(unsafe_code)]
    let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };

    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn disable_core_dumps() -> io::Result<()> {
    Ok(())
}

/// Pin all current and future pages with `mlockall`.
///
/// Requires `CAP_IPC_LOCK` on Linux or running as root.
///
/// # Errors
///
/// Returns the OS error if `mlockall` fails.
#[cfg(unix)]
pub fn lock_memory() -> io::Result<()> {
    // SAFETY: `mlockall` takes only flag bits and has no memory safety
    // implications for this process.
    #[allow(unsafe_code)]
    let result = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };

    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn lock_memory() -> io::Result<()> {
    Ok(())
}
