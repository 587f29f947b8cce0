//! Everything a command handler needs, built once from the loaded config.

use std::sync::Arc;
use std::time::Duration;

use kurye_api::{ApiError, Services, SessionManager};
use kurye_core::{AppConfig, JsonFileStore, ScanError};
use kurye_diagnostics::{
    classify, present_to_user, ErrorReporter, ErrorStats, Failure, PresentOptions, Presenter,
    TracingPresenter,
};
use kurye_weather::WeatherClient;

/// Classifies failures and shows them to the user.
pub(crate) struct Feedback {
    reporter: Arc<ErrorReporter>,
    presenter: TracingPresenter,
}

impl Feedback {
    pub(crate) fn stats(&self) -> ErrorStats {
        self.reporter.stats()
    }

    /// Shows a failed service call and converts it into the command error.
    pub(crate) fn api_failure(&self, err: ApiError, context: &str) -> anyhow::Error {
        self.surface(&err.to_failure(), context, err.is_reported());
        anyhow::Error::new(err).context(context.to_owned())
    }

    pub(crate) fn scan_failure(&self, err: ScanError) -> anyhow::Error {
        self.surface(&Failure::scan(err.to_string()), "packages scan", false);
        anyhow::Error::new(err).context("packages scan")
    }

    pub(crate) fn validation_failure(&self, problems: &[String], context: &str) -> anyhow::Error {
        let message = problems.join("; ");
        self.surface(&Failure::validation(message.clone()), context, false);
        anyhow::anyhow!("{context}: {message}")
    }

    fn surface(&self, failure: &Failure, context: &str, recorded: bool) {
        let record = if recorded {
            classify(failure, context)
        } else {
            self.reporter.report(failure, context)
        };
        let options = PresentOptions {
            force_alert: true,
            ..PresentOptions::default()
        };
        if let Some(dialog) = present_to_user(&record, &options) {
            self.presenter.present(dialog);
        }
    }
}

pub(crate) struct AppContext {
    pub(crate) config: AppConfig,
    pub(crate) session: SessionManager<JsonFileStore>,
    pub(crate) weather: WeatherClient,
    pub(crate) feedback: Feedback,
}

impl AppContext {
    /// Builds the services and restores any saved session.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built or the storage file
    /// cannot be read.
    pub(crate) fn build(config: AppConfig) -> anyhow::Result<Self> {
        let reporter = Arc::new(ErrorReporter::new(config.should_log()));
        let services = Arc::new(Services::new(&config.api_client_options(), &reporter)?);
        let store = JsonFileStore::new(config.storage_path.clone());
        let mut session = SessionManager::new(services, store);
        session.restore()?;

        let weather = WeatherClient::new(
            &config.weather_api_url,
            config.weather_api_key.as_deref(),
            Duration::from_millis(config.api_timeout_ms),
        )?;

        tracing::debug!(
            authenticated = session.session().is_authenticated(),
            storage = %config.storage_path.display(),
            "context ready"
        );

        Ok(Self {
            config,
            session,
            weather,
            feedback: Feedback {
                reporter,
                presenter: TracingPresenter,
            },
        })
    }

    pub(crate) fn services(&self) -> &Services {
        self.session.services()
    }

    pub(crate) fn store(&self) -> &JsonFileStore {
        self.session.store()
    }

    pub(crate) fn require_login(&self) -> anyhow::Result<()> {
        if !self.session.session().is_authenticated() {
            anyhow::bail!("not logged in; run `kurye login` first");
        }
        Ok(())
    }
}
