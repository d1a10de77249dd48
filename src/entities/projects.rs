use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Jam slug.
    pub jam: String,

    /// Project id on the external community site.
    pub project_id: i64,

    pub submitted_by: String,

    pub submitted_at: DateTimeUtc,

    /// Winner chosen by a manager or admin.
    pub selected: bool,

    /// Winner computed from upvote tallies once the jam has closed.
    pub selected_by_the_community: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
