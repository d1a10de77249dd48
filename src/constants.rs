pub mod limits {

    pub const UPVOTES_PER_JAM: u64 = 3;

    pub const DEFAULT_PAGE_SIZE: u64 = 20;

    pub const MAX_PAGE_SIZE: u64 = 100;
}

pub mod auth {

    /// Path on the front-end that receives the one-time token after login.
    pub const CONFIRM_LOGIN_PATH: &str = "/login/confirm";

    pub const LOGIN_ERROR_PATH: &str = "/login/error";

    pub const CALLBACK_PATH: &str = "/api/auth/callback";
}

pub const USER_AGENT: &str = concat!("Jamhub/", env!("CARGO_PKG_VERSION"));
