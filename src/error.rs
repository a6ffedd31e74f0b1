//! Fatal application errors.
//!
//! `AppError` covers the unrecoverable failures: invalid configuration,
//! malformed input files, I/O problems. Per-fit failures inside the
//! bootstrap are *not* `AppError`s; they are the recoverable
//! [`crate::fit::FitError`] and stay local to their iteration.

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Invalid configuration (exit code 2): bad bounds, shapes, percentiles.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Input/output failure (exit code 3): unreadable or malformed files.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
