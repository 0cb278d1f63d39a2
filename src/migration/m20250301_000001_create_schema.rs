use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(include_str!("../../migrations/0001_schema.sql"))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS activities, payments, shipments, order_lines, orders,
                    cart_lines, carts, discounts, shipping_companies, payment_methods,
                    products, subcategories, categories, users, roles CASCADE;
                DROP SEQUENCE IF EXISTS product_code_seq;
                "#,
            )
            .await?;
        Ok(())
    }
}
