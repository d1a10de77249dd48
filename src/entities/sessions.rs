use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner of the session (canonical user name).
    pub name: String,

    /// Durable bearer credential.
    #[sea_orm(unique)]
    pub token: String,

    /// Single-use hand-off credential, cleared once exchanged.
    #[sea_orm(unique)]
    pub one_time_token: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
