pub use super::jams::Entity as Jams;
pub use super::managers::Entity as Managers;
pub use super::projects::Entity as Projects;
pub use super::sessions::Entity as Sessions;
pub use super::upvotes::Entity as Upvotes;
pub use super::users::Entity as Users;
