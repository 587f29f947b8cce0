use std::sync::Arc;

use kurye_core::{
    check_new_package, ApiClientOptions, DeliveryStats, DeliveryStatusUpdate, NewPackage, Package,
    PackageUpdate, SanitizedPayload,
};
use kurye_diagnostics::ErrorReporter;

use crate::client::AuthenticatedClient;
use crate::error::ApiError;
use crate::types::MessageResponse;

/// Client for `/api/packages`. Every endpoint needs a bearer token.
#[derive(Debug)]
pub struct PackageService {
    client: AuthenticatedClient,
}

impl PackageService {
    /// # Errors
    ///
    /// See [`AuthenticatedClient::new`].
    pub fn new(options: &ApiClientOptions, reporter: Arc<ErrorReporter>) -> Result<Self, ApiError> {
        Ok(Self {
            client: AuthenticatedClient::new("PackageService", options, reporter)?,
        })
    }

    #[must_use]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// The courier's packages. An empty or `null` body yields an empty list.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn get_all_packages(&self) -> Result<Vec<Package>, ApiError> {
        let packages: Option<Vec<Package>> = self
            .client
            .get("/api/packages", &[], "Could not load packages")
            .await?;
        let packages = packages.unwrap_or_default();
        warn_inconsistent(&packages);
        Ok(packages)
    }

    /// # Errors
    ///
    /// [`ApiError::Status`] with 404 when the package does not exist.
    pub async fn get_package_by_id(&self, id: i64) -> Result<Package, ApiError> {
        let package: Package = self
            .client
            .get(&format!("/api/packages/{id}"), &[], "Package not found")
            .await?;
        warn_inconsistent(std::slice::from_ref(&package));
        Ok(package)
    }

    /// # Errors
    ///
    /// [`ApiError::Invalid`] if the package fails local checks, otherwise any
    /// backend error (e.g. a duplicate `kargo_id`).
    pub async fn create_package(&self, package: &NewPackage) -> Result<Package, ApiError> {
        check_new_package(package)?;
        self.client
            .post("/api/packages", package, "Could not create package")
            .await
    }

    /// Creates a package from a validated scan. The backend geocodes the
    /// address when `geocode_required` is set.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn create_package_from_scan(
        &self,
        payload: &SanitizedPayload,
    ) -> Result<Package, ApiError> {
        self.client
            .post(
                "/api/packages/qr-scan",
                payload,
                "Could not create package from scan",
            )
            .await
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn update_package(&self, id: i64, update: &PackageUpdate) -> Result<Package, ApiError> {
        self.client
            .put(
                &format!("/api/packages/{id}"),
                update,
                "Could not update package",
            )
            .await
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn delete_package(&self, id: i64) -> Result<MessageResponse, ApiError> {
        self.client
            .delete(&format!("/api/packages/{id}"), "Could not delete package")
            .await
    }

    /// Marks a package delivered, failed, or in transit.
    ///
    /// # Errors
    ///
    /// [`ApiError::Invalid`] without contacting the backend when a failure
    /// reason accompanies a non-failed status.
    pub async fn update_delivery_status(
        &self,
        id: i64,
        update: &DeliveryStatusUpdate,
    ) -> Result<Package, ApiError> {
        update.validate()?;
        self.client
            .patch(
                &format!("/api/packages/{id}/delivery-status"),
                update,
                "Could not update delivery status",
            )
            .await
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn get_delivery_stats(&self) -> Result<DeliveryStats, ApiError> {
        self.client
            .get(
                "/api/packages/delivery-stats",
                &[],
                "Could not load delivery statistics",
            )
            .await
    }
}

/// Logs packages whose status-dependent fields contradict their status and
/// returns how many there were. The packages are still handed to the caller.
fn warn_inconsistent(packages: &[Package]) -> usize {
    let mut flagged = 0;
    for package in packages {
        if let Err(err) = package.check_status_invariants() {
            flagged += 1;
            tracing::warn!(
                id = package.id,
                kargo_id = %package.kargo_id,
                status = %package.status,
                error = %err,
                "backend package violates status invariants"
            );
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use kurye_core::{DeliveryType, FailureReason, PackageStatus};

    use super::*;

    fn package(id: i64, status: PackageStatus) -> Package {
        Package {
            id,
            kargo_id: format!("KRG-{id}"),
            recipient_name: "Ayşe Yılmaz".to_owned(),
            address: "Moda Cd. 12, Kadıköy".to_owned(),
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
    fn counts_only_packages_that_contradict_their_status() {
        let mut stray_reason = package(1, PackageStatus::Pending);
        stray_reason.failure_reason = Some(FailureReason::CustomerNotAvailable);
        let mut stray_delivery = package(2, PackageStatus::InTransit);
        stray_delivery.delivered_at = Some(Utc::now());
        let mut failed = package(3, PackageStatus::Failed);
        failed.failure_reason = Some(FailureReason::CustomerNotAvailable);

        let packages = [stray_reason, stray_delivery, failed, package(4, PackageStatus::Pending)];
        assert_eq!(warn_inconsistent(&packages), 2);
        assert_eq!(warn_inconsistent(&[]), 0);
    }
}
