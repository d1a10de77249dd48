pub mod prelude;

pub mod jams;
pub mod managers;
pub mod projects;
pub mod sessions;
pub mod upvotes;
pub mod users;
