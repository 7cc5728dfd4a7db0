use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A directed edge between two scenarios, shown to the visitor as a clickable choice.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scenario_options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub scenario_id: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub next_scenario_id: String,
    pub order_index: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scenarios::Entity",
        from = "Column::ScenarioId",
        to = "super::scenarios::Column::Id",
        on_delete = "Cascade"
    )]
    Scenario,
    #[sea_orm(
        belongs_to = "super::scenarios::Entity",
        from = "Column::NextScenarioId",
        to = "super::scenarios::Column::Id",
        on_delete = "Cascade"
    )]
    NextScenario,
}

impl Related<super::scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
