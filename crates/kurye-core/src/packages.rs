use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamps;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    Standard,
    Express,
    Scheduled,
}

impl DeliveryType {
    /// Maps the delivery-type spellings found on printed labels to a variant.
    ///
    /// Unknown spellings fall back to [`DeliveryType::Standard`], matching
    /// how the backend treats them.
    #[must_use]
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "express" | "ekspres" | "acil" => DeliveryType::Express,
            "scheduled" | "zamanli" | "zamanlı" | "programli" | "programlı" => {
                DeliveryType::Scheduled
            }
            _ => DeliveryType::Standard,
        }
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryType::Standard => write!(f, "standard"),
            DeliveryType::Express => write!(f, "express"),
            DeliveryType::Scheduled => write!(f, "scheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Failed,
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStatus::Pending => write!(f, "pending"),
            PackageStatus::InTransit => write!(f, "in_transit"),
            PackageStatus::Delivered => write!(f, "delivered"),
            PackageStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PackageStatus::Pending),
            "in_transit" => Ok(PackageStatus::InTransit),
            "delivered" => Ok(PackageStatus::Delivered),
            "failed" => Ok(PackageStatus::Failed),
            other => Err(format!("unknown package status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    CustomerNotFound,
    CustomerRefused,
    WrongAddress,
    CustomerNotAvailable,
    DamagedPackage,
    Other,
}

impl std::str::FromStr for FailureReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer_not_found" => Ok(FailureReason::CustomerNotFound),
            "customer_refused" => Ok(FailureReason::CustomerRefused),
            "wrong_address" => Ok(FailureReason::WrongAddress),
            "customer_not_available" => Ok(FailureReason::CustomerNotAvailable),
            "damaged_package" => Ok(FailureReason::DamagedPackage),
            "other" => Ok(FailureReason::Other),
            other => Err(format!("unknown failure reason '{other}'")),
        }
    }
}

/// A delivery as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    /// Business identifier printed on the label; unique per backend.
    pub kargo_id: String,
    pub recipient_name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub delivery_type: DeliveryType,
    /// `"HH:MM"`.
    #[serde(default)]
    pub time_window_start: Option<String>,
    #[serde(default)]
    pub time_window_end: Option<String>,
    pub status: PackageStatus,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<FailureReason>,
    #[serde(default, deserialize_with = "timestamps::lenient_opt")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamps::lenient")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamps::lenient_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Package {
    /// Checks that status-dependent fields only appear with their status.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FailureReasonWithoutFailedStatus`] or
    /// [`CoreError::DeliveredAtWithoutDeliveredStatus`].
    pub fn check_status_invariants(&self) -> Result<(), CoreError> {
        if self.failure_reason.is_some() && self.status != PackageStatus::Failed {
            return Err(CoreError::FailureReasonWithoutFailedStatus {
                status: self.status,
            });
        }
        if self.delivered_at.is_some() && self.status != PackageStatus::Delivered {
            return Err(CoreError::DeliveredAtWithoutDeliveredStatus {
                status: self.status,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Body of `POST /api/packages` (manual entry form).
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPackage {
    pub kargo_id: String,
    pub recipient_name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Body of `PUT /api/packages/:id`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<DeliveryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PackageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Body of `PATCH /api/packages/:id/delivery-status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStatusUpdate {
    pub status: PackageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl DeliveryStatusUpdate {
    #[must_use]
    pub fn delivered(notes: Option<String>) -> Self {
        Self {
            status: PackageStatus::Delivered,
            notes,
            failure_reason: None,
        }
    }

    #[must_use]
    pub fn failed(reason: FailureReason, notes: Option<String>) -> Self {
        Self {
            status: PackageStatus::Failed,
            notes,
            failure_reason: Some(reason),
        }
    }

    #[must_use]
    pub fn in_transit() -> Self {
        Self {
            status: PackageStatus::InTransit,
            notes: None,
            failure_reason: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::FailureReasonWithoutFailedStatus`] when a
    /// failure reason accompanies any status other than failed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.failure_reason.is_some() && self.status != PackageStatus::Failed {
            return Err(CoreError::FailureReasonWithoutFailedStatus {
                status: self.status,
            });
        }
        Ok(())
    }
}

/// Per-courier counters from `GET /api/packages/delivery-stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub total_packages: u64,
    pub delivered_packages: u64,
    pub failed_packages: u64,
    /// Pending and in-transit packages together.
    pub pending_packages: u64,
    /// Percentage, rounded to one decimal place by the backend.
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(status: PackageStatus) -> Package {
        Package {
            id: 1,
            kargo_id: "KRG-1".to_owned(),
            recipient_name: "Ali Veli".to_owned(),
            address: "Test Mah. No:1".to_owned(),
            phone: None,
            delivery_type: DeliveryType::Standard,
            time_window_start: None,
            time_window_end: None,
            status,
            delivery_notes: None,
            failure_reason: None,
            delivered_at: None,
            created_at: Utc::now(),
            updated_at: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn delivery_type_aliases() {
        assert_eq!(DeliveryType::from_alias("Ekspres"), DeliveryType::Express);
        assert_eq!(DeliveryType::from_alias("acil"), DeliveryType::Express);
        assert_eq!(DeliveryType::from_alias("programli"), DeliveryType::Scheduled);
        assert_eq!(DeliveryType::from_alias("standart"), DeliveryType::Standard);
        assert_eq!(DeliveryType::from_alias("overnight"), DeliveryType::Standard);
    }

    #[test]
    fn failure_reason_requires_failed_status() {
        let mut pkg = package(PackageStatus::Pending);
        pkg.failure_reason = Some(FailureReason::WrongAddress);
        assert_eq!(
            pkg.check_status_invariants(),
            Err(CoreError::FailureReasonWithoutFailedStatus {
                status: PackageStatus::Pending
            })
        );
        pkg.status = PackageStatus::Failed;
        assert!(pkg.check_status_invariants().is_ok());
    }

    #[test]
    fn delivered_at_requires_delivered_status() {
        let mut pkg = package(PackageStatus::InTransit);
        pkg.delivered_at = Some(Utc::now());
        assert!(pkg.check_status_invariants().is_err());
        pkg.status = PackageStatus::Delivered;
        assert!(pkg.check_status_invariants().is_ok());
    }

    #[test]
    fn package_deserializes_backend_shape() {
        let json = serde_json::json!({
            "id": 7,
            "courier_id": 3,
            "kargo_id": "KRG-2025-001",
            "recipient_name": "Mehmet Demir",
            "address": "Atatürk Cad. No:15, Çankaya, Ankara",
            "phone": "+905321234567",
            "delivery_type": "express",
            "status": "in_transit",
            "created_at": "2025-08-01T09:30:00.412000",
            "latitude": 39.9208,
            "longitude": 32.8541
        });
        let pkg: Package = serde_json::from_value(json).unwrap();
        assert_eq!(pkg.delivery_type, DeliveryType::Express);
        assert_eq!(pkg.status, PackageStatus::InTransit);
        assert_eq!(pkg.coordinates(), Some((39.9208, 32.8541)));
    }

    #[test]
    fn status_update_constructors_respect_invariant() {
        assert!(DeliveryStatusUpdate::delivered(None).validate().is_ok());
        assert!(DeliveryStatusUpdate::failed(FailureReason::CustomerRefused, None)
            .validate()
            .is_ok());
        let bad = DeliveryStatusUpdate {
            status: PackageStatus::Delivered,
            notes: None,
            failure_reason: Some(FailureReason::Other),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn status_update_omits_unset_fields() {
        let body = serde_json::to_value(DeliveryStatusUpdate::in_transit()).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "in_transit" }));
    }
}
