use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Canonical casing as reported by the profile service.
    #[sea_orm(unique)]
    pub name: String,

    /// Lowercased `name`, used for case-insensitive lookups.
    #[sea_orm(unique)]
    pub name_key: String,

    pub avatar_url: Option<String>,

    pub admin: bool,

    pub banned: bool,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
