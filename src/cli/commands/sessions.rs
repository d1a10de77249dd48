use crate::config::Config;
use crate::db::Store;
use crate::services::SessionStore;

/// Deletes the stored sessions of `name`. A running server keeps its
/// in-memory index until restart.
pub async fn cmd_sessions_purge(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let sessions = SessionStore::open(store, config.security.session_token_bytes).await?;

    let revoked = sessions.revoke_all_for(name).await?;
    println!("✓ Revoked {revoked} session(s) for {name}");

    Ok(())
}
