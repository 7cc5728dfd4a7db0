use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scenario_options_scenario_id")
                    .table(ScenarioOptions::Table)
                    .col(ScenarioOptions::ScenarioId)
                    .col(ScenarioOptions::OrderIndex)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scenario_options_next_scenario_id")
                    .table(ScenarioOptions::Table)
                    .col(ScenarioOptions::NextScenarioId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scenarios_order_index")
                    .table(Scenarios::Table)
                    .col(Scenarios::OrderIndex)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_scenarios_order_index").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scenario_options_next_scenario_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scenario_options_scenario_id")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Scenarios {
    Table,
    OrderIndex,
}

#[derive(Iden)]
enum ScenarioOptions {
    Table,
    ScenarioId,
    NextScenarioId,
    OrderIndex,
}
