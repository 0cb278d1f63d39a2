pub mod activity_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod discount_service;
pub mod order_service;
pub mod payment_service;
pub mod pricing;
pub mod product_service;
pub mod reference_service;
pub mod report_service;
pub mod shipment_service;
pub mod user_service;
