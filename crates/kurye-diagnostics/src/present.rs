//! Turning records into dialogs, and the seam where dialogs reach a user.

use std::sync::Arc;

use crate::classify::{Category, ErrorRecord, Severity};

/// Callback run when the user picks "Retry".
pub type RetryHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub enum DialogButton {
    Retry(RetryHook),
    Cancel,
    Ok,
}

impl DialogButton {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DialogButton::Retry(_) => "Retry",
            DialogButton::Cancel => "Cancel",
            DialogButton::Ok => "OK",
        }
    }
}

impl std::fmt::Debug for DialogButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub buttons: Vec<DialogButton>,
}

impl Dialog {
    /// A plain informational dialog with a single OK button.
    pub fn notice(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons: vec![DialogButton::Ok],
        }
    }

    /// Runs the retry hook, if the dialog offers one.
    pub fn retry(&self) -> bool {
        for button in &self.buttons {
            if let DialogButton::Retry(hook) = button {
                hook();
                return true;
            }
        }
        false
    }
}

#[derive(Clone, Default)]
pub struct PresentOptions {
    /// Record only; never present.
    pub silent: bool,
    /// Present even low-severity records.
    pub force_alert: bool,
    pub on_retry: Option<RetryHook>,
}

impl PresentOptions {
    #[must_use]
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_retry(hook: RetryHook) -> Self {
        Self {
            on_retry: Some(hook),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for PresentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentOptions")
            .field("silent", &self.silent)
            .field("force_alert", &self.force_alert)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Where dialogs go: an alert in a UI, a log line in the CLI, a vec in tests.
pub trait Presenter: Send + Sync {
    fn present(&self, dialog: Dialog);
}

/// Presents dialogs as `warn`-level log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn present(&self, dialog: Dialog) {
        let buttons: Vec<&str> = dialog.buttons.iter().map(DialogButton::label).collect();
        tracing::warn!(
            title = %dialog.title,
            buttons = ?buttons,
            "{}",
            dialog.message
        );
    }
}

#[must_use]
pub fn category_title(category: Category) -> &'static str {
    match category {
        Category::Network => "Connection Error",
        Category::Location => "Location Error",
        Category::Api => "Server Error",
        Category::QrCode => "QR Code Error",
        Category::Validation => "Invalid Input",
        Category::Unknown => "Error",
    }
}

/// Builds the dialog for `record`, or `None` when it should stay quiet.
///
/// Low-severity records are quiet unless `force_alert` is set. `silent` is
/// not consulted here; callers that honour it skip this call entirely.
#[must_use]
pub fn present_to_user(record: &ErrorRecord, options: &PresentOptions) -> Option<Dialog> {
    if record.severity == Severity::Low && !options.force_alert {
        return None;
    }

    let buttons = match (&options.on_retry, record.actionable) {
        (Some(hook), true) => vec![DialogButton::Retry(Arc::clone(hook)), DialogButton::Cancel],
        _ => vec![DialogButton::Ok],
    };

    Some(Dialog {
        title: category_title(record.category).to_owned(),
        message: record.user_message.clone(),
        buttons,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::classify::classify;
    use crate::failure::{Failure, LocationErrorCode};

    fn counting_hook() -> (RetryHook, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        let hook: RetryHook = Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (hook, count)
    }

    #[test]
    fn low_severity_is_quiet_unless_forced() {
        let record = classify(&Failure::validation("bad"), "form");
        assert!(present_to_user(&record, &PresentOptions::default()).is_none());

        let forced = PresentOptions {
            force_alert: true,
            ..PresentOptions::default()
        };
        let dialog = present_to_user(&record, &forced).unwrap();
        assert_eq!(dialog.title, "Invalid Input");
        assert_eq!(dialog.message, "Check the entered information.");
    }

    #[test]
    fn actionable_with_hook_offers_retry_and_cancel() {
        let (hook, count) = counting_hook();
        let record = classify(
            &Failure::location(LocationErrorCode::Timeout, "timeout"),
            "LocationClient",
        );
        let dialog = present_to_user(&record, &PresentOptions::with_retry(hook)).unwrap();
        assert_eq!(dialog.title, "Location Error");
        let labels: Vec<_> = dialog.buttons.iter().map(DialogButton::label).collect();
        assert_eq!(labels, ["Retry", "Cancel"]);

        assert!(dialog.retry());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_actionable_gets_ok_even_with_hook() {
        let (hook, _count) = counting_hook();
        let record = classify(&Failure::http(403, "forbidden"), "ctx");
        let dialog = present_to_user(&record, &PresentOptions::with_retry(hook)).unwrap();
        assert_eq!(dialog.title, "Server Error");
        assert!(matches!(dialog.buttons.as_slice(), [DialogButton::Ok]));
        assert!(!dialog.retry());
    }

    #[test]
    fn actionable_without_hook_gets_ok() {
        let record = classify(&Failure::network("down"), "ctx");
        let dialog = present_to_user(&record, &PresentOptions::default()).unwrap();
        assert_eq!(dialog.title, "Connection Error");
        assert!(matches!(dialog.buttons.as_slice(), [DialogButton::Ok]));
    }
}
