//! Ordered classification rules.
//!
//! Each rule looks at the failure and the caller-supplied context and either
//! claims it or passes. The first rule to claim a failure decides its
//! category; unclaimed failures are [`Category::Unknown`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::failure::{Failure, FailureKind, LocationErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Network,
    Location,
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "QRCode")]
    QrCode,
    Validation,
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Network => write!(f, "Network"),
            Category::Location => write!(f, "Location"),
            Category::Api => write!(f, "API"),
            Category::QrCode => write!(f, "QRCode"),
            Category::Validation => write!(f, "Validation"),
            Category::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A classified failure, as kept in the error log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub category: Category,
    pub severity: Severity,
    pub user_message: String,
    pub actionable: bool,
    pub original_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Classification {
    category: Category,
    severity: Severity,
    user_message: String,
    actionable: bool,
}

impl Classification {
    fn new(
        category: Category,
        severity: Severity,
        user_message: impl Into<String>,
        actionable: bool,
    ) -> Self {
        Self {
            category,
            severity,
            user_message: user_message.into(),
            actionable,
        }
    }
}

type Rule = fn(&Failure, &str) -> Option<Classification>;

const RULES: &[Rule] = &[
    network_rule,
    location_rule,
    http_rule,
    scan_rule,
    validation_rule,
];

/// Classifies `failure` raised in `context` (e.g. `"PackageService.get_all_packages"`).
#[must_use]
pub fn classify(failure: &Failure, context: &str) -> ErrorRecord {
    let classification = RULES
        .iter()
        .find_map(|rule| rule(failure, context))
        .unwrap_or_else(|| {
            Classification::new(
                Category::Unknown,
                Severity::Medium,
                "Something went wrong.",
                false,
            )
        });

    ErrorRecord {
        timestamp: Utc::now(),
        context: context.to_owned(),
        category: classification.category,
        severity: classification.severity,
        user_message: classification.user_message,
        actionable: classification.actionable,
        original_error: failure.message.clone(),
    }
}

fn mentions(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn network_rule(failure: &Failure, _context: &str) -> Option<Classification> {
    let matched = match failure.kind {
        FailureKind::Network => true,
        FailureKind::Other => mentions(&failure.message, "network"),
        _ => false,
    };
    matched.then(|| {
        Classification::new(
            Category::Network,
            Severity::High,
            "Check your internet connection.",
            true,
        )
    })
}

fn location_rule(failure: &Failure, _context: &str) -> Option<Classification> {
    let FailureKind::Location(code) = &failure.kind else {
        return None;
    };
    let (message, actionable) = match code {
        LocationErrorCode::Timeout => ("Timed out while getting location. Try again.", true),
        LocationErrorCode::Unavailable => ("GPS services are unavailable.", true),
        LocationErrorCode::PermissionDenied => ("Location permission is required.", true),
        LocationErrorCode::Other(_) => ("Location service error.", false),
    };
    Some(Classification::new(
        Category::Location,
        Severity::Medium,
        message,
        actionable,
    ))
}

fn http_rule(failure: &Failure, _context: &str) -> Option<Classification> {
    let FailureKind::Http { status } = failure.kind else {
        return None;
    };
    let classification = match status {
        401 => Classification::new(
            Category::Api,
            Severity::High,
            "Session expired. Please log in again.",
            true,
        ),
        403 => Classification::new(
            Category::Api,
            Severity::High,
            "You are not allowed to do this.",
            false,
        ),
        404 => Classification::new(
            Category::Api,
            Severity::Medium,
            "The requested resource was not found.",
            false,
        ),
        s if s >= 500 => Classification::new(
            Category::Api,
            Severity::High,
            "Server error. Please try again later.",
            true,
        ),
        s => Classification::new(Category::Api, Severity::Medium, format!("API error: {s}"), false),
    };
    Some(classification)
}

fn scan_rule(failure: &Failure, context: &str) -> Option<Classification> {
    let matched = failure.kind == FailureKind::Scan
        || [context, failure.message.as_str()]
            .iter()
            .any(|text| mentions(text, "qr") || mentions(text, "scan"));
    matched.then(|| {
        Classification::new(
            Category::QrCode,
            Severity::Medium,
            "Could not read the code. Try again.",
            true,
        )
    })
}

fn validation_rule(failure: &Failure, _context: &str) -> Option<Classification> {
    let matched = failure.kind == FailureKind::Validation
        || ["invalid", "required", "missing"]
            .iter()
            .any(|word| mentions(&failure.message, word));
    matched.then(|| {
        Classification::new(
            Category::Validation,
            Severity::Low,
            "Check the entered information.",
            true,
        )
    })
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
