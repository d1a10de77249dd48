pub mod jam;
pub mod project;
pub mod session;
pub mod user;

pub use jam::{Jam, JamContent, JamDates, JamMeta, JamOptions, JamPatch, NewJam};
pub use project::{Project, ProjectEntry, Upvote};
pub use session::Session;
pub use user::User;
