//! Environment isolation for path tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes every test that touches `MONTEUR_*` variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the environment lock and restores every touched variable on drop.
pub struct EnvScope {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            // A failed test must not take the rest down with it
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    #[allow(unsafe_code)]
    pub fn set(&mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> &mut Self {
        self.remember(key);
        unsafe {
            env::set_var(key, value);
        }
        self
    }

    #[allow(unsafe_code)]
    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.remember(key);
        unsafe {
            env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(k, _)| k == key) {
            self.saved.push((key.to_string(), env::var_os(key)));
        }
    }
}

impl Drop for EnvScope {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            unsafe {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
