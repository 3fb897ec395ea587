//! Wiring of the workflow components from [`Settings`].

use std::sync::Arc;

use mlchain_core::{DirectoryProfiles, FileSystemWallets, ProfileSource, Settings, WalletProvider};
use mlchain_fabric::{CaConnector, Gateway, HttpCaConnector, HttpGateway};

use crate::connector::{Actor, Connector};
use crate::enrollment::EnrollmentWorkflow;
use crate::model::ModelContract;
use crate::token::TokenContract;

/// Every workflow component, sharing one [`Connector`].
#[derive(Debug, Clone)]
pub struct Services {
    /// Session factory.
    pub connector: Connector,
    /// Identity enrollment.
    pub enrollment: EnrollmentWorkflow,
    /// Token chaincode.
    pub tokens: TokenContract,
    /// Model chaincode.
    pub models: ModelContract,
}

impl Services {
    /// Assemble from explicit collaborators.
    pub fn new(
        settings: Arc<Settings>,
        profiles: Arc<dyn ProfileSource>,
        wallets: Arc<dyn WalletProvider>,
        gateway: Arc<dyn Gateway>,
        cas: Arc<dyn CaConnector>,
    ) -> Self {
        let connector = Connector::new(settings, profiles, wallets, gateway);
        Self {
            enrollment: EnrollmentWorkflow::new(connector.clone(), cas),
            tokens: TokenContract::new(connector.clone()),
            models: ModelContract::new(connector.clone()),
            connector,
        }
    }

    /// Profiles and wallets on disk, HTTP clients for the CA and peers.
    pub fn from_settings(settings: Settings) -> Self {
        let timeout = settings.timeout();
        let profiles = Arc::new(DirectoryProfiles::new(&settings.connection_dir));
        let wallets = Arc::new(FileSystemWallets::new(&settings.wallet_dir));
        Self::new(
            Arc::new(settings),
            profiles,
            wallets,
            Arc::new(HttpGateway::new(timeout)),
            Arc::new(HttpCaConnector::new(timeout)),
        )
    }

    /// Runtime settings.
    pub fn settings(&self) -> &Settings {
        self.connector.settings()
    }

    /// The token administrator, which sells tokens and grants roles.
    pub fn token_admin(&self) -> Actor {
        self.connector.admin_of(&self.settings().token_admin_org)
    }

    /// The identity used for model registry reads.
    pub fn model_reader(&self) -> Actor {
        self.connector.admin_of(&self.settings().model_reader_org)
    }
}
