pub mod jam;
pub mod manager;
pub mod project;
pub mod session;
pub mod upvote;
pub mod user;
