use super::CLI_ACTOR;
use crate::config::Config;
use crate::db::Store;

pub async fn cmd_admin_grant(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if let Some(user) = store.set_user_admin(name, true, CLI_ACTOR).await? {
        println!("✓ {} is now an admin", user.name);
        return Ok(());
    }

    match store.create_user(name, None, true, CLI_ACTOR).await? {
        Some(user) => println!("✓ Created admin {}", user.name),
        None => println!("User {name} could not be created."),
    }

    Ok(())
}

pub async fn cmd_admin_revoke(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match store.set_user_admin(name, false, CLI_ACTOR).await? {
        Some(user) => println!("✓ {} is no longer an admin", user.name),
        None => println!("User {name} not found."),
    }

    Ok(())
}
