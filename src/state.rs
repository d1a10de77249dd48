use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::{
    CommunityClient, IdentityProviderClient, IdentityVerifier, ProfileDirectory, ProjectDirectory,
    build_http_client,
};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, Authorizer, IdentityBridge, JamService, ProjectService, SeaOrmAccountService,
    SeaOrmJamService, SeaOrmProjectService, SessionStore, UpvoteLedger, WinnerResolver,
};

/// Upstream collaborators. Production wiring talks HTTP; tests pass fakes.
#[derive(Clone)]
pub struct Clients {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub projects: Arc<dyn ProjectDirectory>,
}

impl Clients {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = build_http_client(config.identity.request_timeout_seconds)?;

        let community = Arc::new(CommunityClient::new(
            http_client.clone(),
            &config.identity.profile_api_url,
        ));
        let verifier = Arc::new(IdentityProviderClient::new(
            http_client,
            config.identity.verify_url.clone(),
        ));

        Ok(Self {
            verifier,
            profiles: community.clone(),
            projects: community,
        })
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub sessions: Arc<SessionStore>,

    pub identity: Arc<IdentityBridge>,

    pub authorizer: Authorizer,

    pub winners: Arc<WinnerResolver>,

    pub upvotes: Arc<UpvoteLedger>,

    pub jam_service: Arc<dyn JamService>,

    pub project_service: Arc<dyn ProjectService>,

    pub account_service: Arc<dyn AccountService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let clients = Clients::from_config(&config)?;
        Self::with_clients(config, clients).await
    }

    pub async fn with_clients(config: Config, clients: Clients) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let sessions = Arc::new(
            SessionStore::open(store.clone(), config.security.session_token_bytes)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open session store: {e}"))?,
        );

        let identity = Arc::new(IdentityBridge::new(
            &config,
            store.clone(),
            clients.verifier.clone(),
            clients.profiles.clone(),
        ));

        let authorizer = Authorizer::new(store.clone());
        let winners = Arc::new(WinnerResolver::new(store.clone()));
        let upvotes = Arc::new(UpvoteLedger::new(
            store.clone(),
            winners.clone(),
            config.jams.upvote_cap,
        ));

        let jam_service = Arc::new(SeaOrmJamService::new(store.clone(), authorizer.clone()))
            as Arc<dyn JamService>;

        let project_service = Arc::new(SeaOrmProjectService::new(
            store.clone(),
            authorizer.clone(),
            winners.clone(),
            clients.projects.clone(),
        )) as Arc<dyn ProjectService>;

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            authorizer.clone(),
            sessions.clone(),
            clients.profiles.clone(),
        )) as Arc<dyn AccountService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            sessions,
            identity,
            authorizer,
            winners,
            upvotes,
            jam_service,
            project_service,
            account_service,
        })
    }
}
