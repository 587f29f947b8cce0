//! Failure classification, the bounded error log, and user-facing dialogs.
//!
//! Library crates convert their own errors into a [`Failure`]; the
//! [`ErrorReporter`] classifies it into an [`ErrorRecord`], keeps the most
//! recent records, and optionally hands a [`Dialog`] to a [`Presenter`].

pub mod classify;
pub mod failure;
pub mod log;
pub mod present;
pub mod reporter;

pub use classify::{classify, Category, ErrorRecord, Severity};
pub use failure::{Failure, FailureKind, LocationErrorCode};
pub use log::{ErrorLog, DEFAULT_CAPACITY};
pub use present::{
    category_title, present_to_user, Dialog, DialogButton, PresentOptions, Presenter, RetryHook,
    TracingPresenter,
};
pub use reporter::{ErrorReporter, ErrorStats};
