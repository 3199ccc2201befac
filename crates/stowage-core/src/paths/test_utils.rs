//! Environment isolation for path tests.

use std::env;
use std::ffi::{OsStr, OsString};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

/// Serializes every test that touches `STOWAGE_*` variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with `vars` applied (`None` removes the variable).
///
/// Previous values are restored afterwards, even if `f` panics.
pub fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let saved: Vec<(String, Option<OsString>)> = vars
        .iter()
        .map(|(key, _)| ((*key).to_string(), env::var_os(key)))
        .collect();
    for (key, value) in vars {
        apply(key, value.map(OsStr::new));
    }

    let result = panic::catch_unwind(AssertUnwindSafe(f));

    for (key, value) in &saved {
        apply(key, value.as_deref());
    }
    result.unwrap_or_else(|payload| panic::resume_unwind(payload))
}

#[allow(unsafe_code)]
fn apply(key: &str, value: Option<&OsStr>) {
    // SAFETY: callers hold ENV_LOCK, so no other test reads the environment concurrently.
    unsafe {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
