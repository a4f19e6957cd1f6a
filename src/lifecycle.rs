//! Process-wide library lifecycle.
//!
//! ```text
//! Uninitialized ──init──▶ Live ──shutdown──▶ ShutDown
//!                          ▲ │
//!                          └─┘ init (no-op)
//! ```
//!
//! Handles can only be created, and saves only run, while the library is
//! live. Shutdown is one-way: a later [`init`] is rejected.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

const UNINITIALIZED: u8 = 0;
const LIVE: u8 = 1;
const SHUT_DOWN: u8 = 2;

static STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);

/// Bring the library up. Calling it again while live is a no-op.
pub fn init() -> Result<()> {
    match STATE.compare_exchange(UNINITIALIZED, LIVE, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            debug!("image library initialized");
            Ok(())
        }
        Err(LIVE) => Ok(()),
        Err(_) => Err(Error::Init("library has been shut down".into())),
    }
}

/// Tear the library down for the rest of the process.
///
/// Handles still alive keep their resources and release them normally, but
/// no new handle can be created and no save will run.
pub fn shutdown() {
    if STATE.swap(SHUT_DOWN, Ordering::AcqRel) != SHUT_DOWN {
        debug!("image library shut down");
    }
}

pub fn is_live() -> bool {
    STATE.load(Ordering::Acquire) == LIVE
}

pub(crate) fn ensure_live() -> Result<()> {
    match STATE.load(Ordering::Acquire) {
        LIVE => Ok(()),
        UNINITIALIZED => Err(Error::Init("library not initialized".into())),
        _ => Err(Error::Init("library has been shut down".into())),
    }
}
