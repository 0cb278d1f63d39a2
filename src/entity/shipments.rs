use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::ShipmentState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_id: Uuid,
    pub address: String,
    pub company_id: Uuid,
    pub tracking_code: String,
    pub state: ShipmentState,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::shipping_companies::Entity",
        from = "Column::CompanyId",
        to = "super::shipping_companies::Column::Id"
    )]
    ShippingCompanies,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::shipping_companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingCompanies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
