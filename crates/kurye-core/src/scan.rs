//! Validation and sanitisation of scanned package labels.
//!
//! A label encodes a JSON object with Turkish field names (`kargo_id`,
//! `alici`, `adres`, ...). [`validate_scan`] applies the hard gates in order
//! and stops at the first failure; soft problems come back as
//! [`ScanWarning`]s alongside the sanitised payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::packages::{DeliveryType, NewPackage};
use crate::CoreError;

const MAX_TEXT_CHARS: usize = 500;
const RECIPIENT_FORBIDDEN: &[char] = &['<', '>', '{', '}', '[', ']', '\\'];

static KARGO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid kargo id regex"));

static PHONE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^\+90\d{10}$").expect("valid phone regex"),
        Regex::new(r"^90\d{10}$").expect("valid phone regex"),
        Regex::new(r"^0\d{10}$").expect("valid phone regex"),
        Regex::new(r"^\d{10}$").expect("valid phone regex"),
    ]
});

#[derive(Debug, Error, PartialEq)]
pub enum ScanError {
    #[error("scan payload is empty")]
    Empty,

    #[error("scan payload is not a JSON object: {0}")]
    Format(String),

    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("field '{field}' must be a string")]
    FieldType { field: &'static str },

    #[error("invalid kargo_id: {0}")]
    InvalidKargoId(&'static str),

    #[error("invalid recipient name: {0}")]
    InvalidRecipient(&'static str),

    #[error("invalid address: {0}")]
    InvalidAddress(&'static str),

    #[error("invalid phone number")]
    InvalidPhone,

    #[error("invalid latitude")]
    InvalidLatitude,

    #[error("invalid longitude")]
    InvalidLongitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanWarning {
    MissingPhone,
    /// The backend will have to geocode the address.
    MissingCoordinates,
    DefaultDeliveryType,
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanWarning::MissingPhone => write!(f, "phone number is missing"),
            ScanWarning::MissingCoordinates => {
                write!(f, "coordinates are missing (geocoding may be required)")
            }
            ScanWarning::DefaultDeliveryType => {
                write!(f, "delivery type not specified, using standard")
            }
        }
    }
}

/// The cleaned label, ready for `POST /api/packages/qr-scan`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedPayload {
    pub kargo_id: String,
    pub alici: String,
    pub adres: String,
    pub telefon: Option<String>,
    pub teslimat_turu: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zaman_penceresi: Option<Vec<String>>,
    pub geocode_required: bool,
}

impl SanitizedPayload {
    #[must_use]
    pub fn delivery_type(&self) -> DeliveryType {
        DeliveryType::from_alias(&self.teslimat_turu)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub payload: SanitizedPayload,
    pub warnings: Vec<ScanWarning>,
    pub geocode_required: bool,
}

/// Trims, strips `<`, `>` and `\`, and caps the result at 500 characters.
///
/// Applying it twice yields the same string as applying it once.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\\'))
        .collect();
    let truncated: String = stripped.trim().chars().take(MAX_TEXT_CHARS).collect();
    truncated.trim_end().to_owned()
}

/// Validates and sanitises a raw scanned string.
///
/// # Errors
///
/// Returns the first [`ScanError`] hit, in this order: empty input, JSON
/// shape, missing required fields (all of them listed), field contents,
/// then optional phone and coordinates.
pub fn validate_scan(raw: &str) -> Result<ScanOutcome, ScanError> {
    if raw.trim().is_empty() {
        return Err(ScanError::Empty);
    }

    let value: Value = serde_json::from_str(raw).map_err(|e| ScanError::Format(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(ScanError::Format("expected an object".to_owned()));
    };

    let missing: Vec<&'static str> = ["kargo_id", "alici", "adres"]
        .into_iter()
        .filter(|field| is_missing(obj.get(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(ScanError::MissingFields(missing));
    }

    let kargo_id = required_str(&obj, "kargo_id")?;
    let alici = required_str(&obj, "alici")?;
    let adres = required_str(&obj, "adres")?;

    check_kargo_id(kargo_id)?;
    check_recipient(alici)?;
    check_address(adres)?;

    let telefon = optional_text(obj.get("telefon"));
    if let Some(phone) = &telefon {
        if !is_valid_phone(phone) {
            return Err(ScanError::InvalidPhone);
        }
    }

    let nested = obj.get("koordinatlar").and_then(Value::as_object);
    let latitude = coordinate(&obj, nested, "latitude")
        .map_err(|()| ScanError::InvalidLatitude)?;
    let longitude = coordinate(&obj, nested, "longitude")
        .map_err(|()| ScanError::InvalidLongitude)?;
    if latitude.is_some_and(|lat| !latitude_in_range(lat)) {
        return Err(ScanError::InvalidLatitude);
    }
    if longitude.is_some_and(|lng| !longitude_in_range(lng)) {
        return Err(ScanError::InvalidLongitude);
    }

    let teslimat_turu = optional_text(obj.get("teslimat_turu"));
    let geocode_required = latitude.is_none() || longitude.is_none();

    let mut warnings = Vec::new();
    if telefon.is_none() {
        warnings.push(ScanWarning::MissingPhone);
    }
    if geocode_required {
        warnings.push(ScanWarning::MissingCoordinates);
    }
    if teslimat_turu.is_none() {
        warnings.push(ScanWarning::DefaultDeliveryType);
    }

    let payload = SanitizedPayload {
        kargo_id: sanitize_text(kargo_id),
        alici: sanitize_text(alici),
        adres: sanitize_text(adres),
        telefon: telefon.as_deref().map(sanitize_text),
        teslimat_turu: teslimat_turu
            .as_deref()
            .map_or_else(|| DeliveryType::Standard.to_string(), sanitize_text),
        latitude,
        longitude,
        zaman_penceresi: time_window(obj.get("zaman_penceresi")),
        geocode_required,
    };

    Ok(ScanOutcome {
        payload,
        warnings,
        geocode_required,
    })
}

/// Checks a manually entered package; returns every problem found.
#[must_use]
pub fn validate_package_data(pkg: &NewPackage) -> Vec<String> {
    let mut errors = Vec::new();
    if pkg.kargo_id.trim().is_empty() {
        errors.push("kargo_id is required".to_owned());
    }
    if pkg.recipient_name.trim().is_empty() {
        errors.push("recipient name is required".to_owned());
    }
    if pkg.address.trim().is_empty() {
        errors.push("address is required".to_owned());
    }
    if let Some(phone) = pkg.phone.as_deref().filter(|p| !p.is_empty()) {
        if !is_valid_phone(phone) {
            errors.push("invalid phone number".to_owned());
        }
    }
    if let (Some(lat), Some(lng)) = (pkg.latitude, pkg.longitude) {
        errors.extend(validate_coordinates(lat, lng));
    }
    errors
}

/// Rejects a manually entered package before it is sent.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPackage`] carrying every problem from
/// [`validate_package_data`].
pub fn check_new_package(pkg: &NewPackage) -> Result<(), CoreError> {
    let errors = validate_package_data(pkg);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidPackage(errors))
    }
}

#[must_use]
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Vec<String> {
    let mut errors = Vec::new();
    if !latitude_in_range(latitude) {
        errors.push("invalid latitude".to_owned());
    }
    if !longitude_in_range(longitude) {
        errors.push("invalid longitude".to_owned());
    }
    errors
}

/// Turkish phone shapes: `+90`, `90` or `0` prefix, or the bare ten digits.
/// Spaces, hyphens and parentheses are ignored.
#[must_use]
pub fn is_valid_phone(raw: &str) -> bool {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    PHONE_PATTERNS.iter().any(|re| re.is_match(&cleaned))
}

fn latitude_in_range(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

fn longitude_in_range(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng)
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ScanError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(ScanError::FieldType { field })
}

fn check_kargo_id(id: &str) -> Result<(), ScanError> {
    let len = id.chars().count();
    if len < 3 {
        return Err(ScanError::InvalidKargoId("too short"));
    }
    if len > 50 {
        return Err(ScanError::InvalidKargoId("too long"));
    }
    if !KARGO_ID_RE.is_match(id) {
        return Err(ScanError::InvalidKargoId("contains invalid characters"));
    }
    Ok(())
}

fn check_recipient(name: &str) -> Result<(), ScanError> {
    if name.trim().chars().count() < 2 {
        return Err(ScanError::InvalidRecipient("too short"));
    }
    if name.chars().count() > 100 {
        return Err(ScanError::InvalidRecipient("too long"));
    }
    if name.contains(RECIPIENT_FORBIDDEN) {
        return Err(ScanError::InvalidRecipient("contains invalid characters"));
    }
    Ok(())
}

fn check_address(address: &str) -> Result<(), ScanError> {
    if address.trim().chars().count() < 5 {
        return Err(ScanError::InvalidAddress("too short"));
    }
    if address.chars().count() > MAX_TEXT_CHARS {
        return Err(ScanError::InvalidAddress("too long"));
    }
    Ok(())
}

/// Optional text field; numbers are accepted and rendered as digits.
fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a coordinate from the top level, falling back to `koordinatlar`.
///
/// `Ok(None)` means absent; `Err(())` means present but not numeric.
fn coordinate(
    obj: &Map<String, Value>,
    nested: Option<&Map<String, Value>>,
    key: &str,
) -> Result<Option<f64>, ()> {
    let top = obj.get(key).filter(|v| !v.is_null());
    let value = top.or_else(|| nested.and_then(|n| n.get(key)).filter(|v| !v.is_null()));
    match value {
        None => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or(()),
        Some(_) => Err(()),
    }
}

fn time_window(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(sanitize_text))
        .collect()
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod tests;
