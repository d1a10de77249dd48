pub mod key_lock;
pub use key_lock::KeyedLocks;

pub mod session_store;
pub use session_store::{IssuedSession, SessionError, SessionStore};

pub mod identity_bridge;
pub use identity_bridge::{AuthFailure, IdentityBridge};

pub mod authorization;
pub use authorization::{Authorizer, Role, Scope};

pub mod winner_resolver;
pub use winner_resolver::{Resolution, WinnerResolver};

pub mod upvote_ledger;
pub use upvote_ledger::{Remaining, UpvoteError, UpvoteLedger, UpvoteTally};

pub mod jam_service;
pub mod jam_service_impl;
pub use jam_service::{JamError, JamPage, JamQuery, JamService};
pub use jam_service_impl::SeaOrmJamService;

pub mod project_service;
pub mod project_service_impl;
pub use project_service::{ProjectError, ProjectService};
pub use project_service_impl::SeaOrmProjectService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService};
pub use account_service_impl::SeaOrmAccountService;
