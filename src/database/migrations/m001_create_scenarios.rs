use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scenarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Scenarios::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Scenarios::Message).text().not_null())
                    .col(ColumnDef::new(Scenarios::HtmlContent).text())
                    .col(ColumnDef::new(Scenarios::ParentId).string())
                    .col(
                        ColumnDef::new(Scenarios::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Scenarios::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Scenarios::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Both references cascade: removing a scenario drops its own options
        // and every option that pointed at it.
        manager
            .create_table(
                Table::create()
                    .table(ScenarioOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScenarioOptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScenarioOptions::ScenarioId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScenarioOptions::Text).text().not_null())
                    .col(
                        ColumnDef::new(ScenarioOptions::NextScenarioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScenarioOptions::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_options_scenario_id")
                            .from(ScenarioOptions::Table, ScenarioOptions::ScenarioId)
                            .to(Scenarios::Table, Scenarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_options_next_scenario_id")
                            .from(ScenarioOptions::Table, ScenarioOptions::NextScenarioId)
                            .to(Scenarios::Table, Scenarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScenarioOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Scenarios::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Scenarios {
    Table,
    Id,
    Message,
    HtmlContent,
    ParentId,
    OrderIndex,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ScenarioOptions {
    Table,
    Id,
    ScenarioId,
    Text,
    NextScenarioId,
    OrderIndex,
}
