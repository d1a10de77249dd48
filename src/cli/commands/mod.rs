mod admin;
mod sessions;

pub use admin::{cmd_admin_grant, cmd_admin_revoke};
pub use sessions::cmd_sessions_purge;

/// Actor recorded in `updatedBy` for changes made from the command line.
const CLI_ACTOR: &str = "cli";
