// ── Console session ──
//
// The shared handle every stage works through: one authenticated API
// client plus the channel waits publish their progress on. Stage
// operations (sites, scans, reports, downloads, the pipeline) are inherent
// methods implemented in their own modules.

use std::sync::Arc;

use nexrun_api::{BasicCredentials, NexposeClient, TlsMode, TransportConfig};
use tokio::sync::watch;
use tracing::debug;

use crate::config::{SessionConfig, TlsVerification};
use crate::error::CoreError;
use crate::poll::WaitState;

/// Authenticated access to one console.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the
/// progress channel. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Session {
    client: NexposeClient,
    progress: Arc<watch::Sender<WaitState>>,
}

impl Session {
    /// Build the transport described by `config`.
    ///
    /// No request is made; a bad password surfaces on the first call.
    pub fn connect(config: &SessionConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let credentials = BasicCredentials::new(config.username.clone(), config.password.clone());
        let client = NexposeClient::new(config.api_url.as_str(), credentials, &transport)?;
        debug!(api_url = %client.base_url(), "session ready");
        Ok(Self::from_client(client))
    }

    /// Wrap an already-configured API client.
    pub fn from_client(client: NexposeClient) -> Self {
        let (progress, _) = watch::channel(WaitState::Idle);
        Self {
            client,
            progress: Arc::new(progress),
        }
    }

    /// The underlying API client.
    pub fn client(&self) -> &NexposeClient {
        &self.client
    }

    /// Subscribe to progress of the wait currently in flight.
    pub fn wait_state(&self) -> watch::Receiver<WaitState> {
        self.progress.subscribe()
    }

    pub(crate) fn progress(&self) -> &watch::Sender<WaitState> {
        &self.progress
    }
}

fn build_transport(config: &SessionConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn connect_normalizes_api_root() {
        let config = SessionConfig::new(
            "https://console:3780/api/3".parse().unwrap(),
            "nxadmin",
            SecretString::from("pw".to_string()),
        );
        let session = Session::connect(&config).unwrap();
        assert_eq!(
            session.client().base_url().as_str(),
            "https://console:3780/api/3/"
        );
        assert_eq!(*session.wait_state().borrow(), WaitState::Idle);
    }

    #[test]
    fn unreadable_ca_is_a_connection_error() {
        let mut config = SessionConfig::new(
            "https://console:3780/api/3".parse().unwrap(),
            "nxadmin",
            SecretString::from("pw".to_string()),
        );
        config.tls = TlsVerification::CustomCa("/nonexistent/ca.pem".into());
        let err = Session::connect(&config).unwrap_err();
        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    }
}
