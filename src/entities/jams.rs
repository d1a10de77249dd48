use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stable identifier that child rows (managers, projects, upvotes) reference.
    #[sea_orm(unique)]
    pub slug: String,

    pub name: String,

    pub date_start: DateTimeUtc,

    pub date_end: DateTimeUtc,

    pub voting_start: Option<DateTimeUtc>,

    pub voting_end: Option<DateTimeUtc>,

    pub description: Option<String>,

    pub body: Option<String>,

    /// Free-form theme colors, e.g. `{"primary": "#ff6600"}`.
    pub colors: Option<Json>,

    pub header_image: Option<String>,

    pub enable_mystery: bool,

    pub featured: bool,

    pub created_at: DateTimeUtc,

    pub created_by: String,

    pub updated_at: DateTimeUtc,

    pub updated_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
