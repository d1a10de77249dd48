use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for index in [
            "idx_managers_jam_name",
            "idx_upvotes_jam_project_user",
            "idx_upvotes_jam_user",
        ] {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {index}"))
                .await?;
        }

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_managers_jam_name_key ON managers(jam, lower(name))",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_upvotes_jam_project_voter ON upvotes(jam, project_id, lower(upvoted_by))",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_upvotes_jam_voter ON upvotes(jam, lower(upvoted_by))",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for index in [
            "idx_upvotes_jam_voter",
            "idx_upvotes_jam_project_voter",
            "idx_managers_jam_name_key",
        ] {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {index}"))
                .await?;
        }

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_managers_jam_name ON managers(jam, name)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_upvotes_jam_project_user ON upvotes(jam, project_id, upvoted_by)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_upvotes_jam_user ON upvotes(jam, upvoted_by)",
        )
        .await?;

        Ok(())
    }
}
