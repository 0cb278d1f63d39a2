use axum::Router;

use crate::state::AppState;

pub mod activities;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod discounts;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod reference;
pub mod reports;
pub mod shipments;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/usuarios", auth::router().merge(users::router()))
        .nest("/roles", users::roles_router())
        .nest("/categorias", catalog::categories_router())
        .nest("/subcategorias", catalog::subcategories_router())
        .nest("/productos", catalog::products_router())
        .nest("/descuentos", discounts::router())
        .nest("/metodos-pago", reference::payment_methods_router())
        .nest("/empresas", reference::shipping_companies_router())
        .nest("/carritos", cart::router())
        .nest("/pedidos", orders::router())
        .nest("/pedido-detalles", orders::lines_router())
        .nest("/envios", shipments::shipments_router())
        .nest("/pagos", shipments::payments_router())
        .nest("/actividades", activities::router())
        .nest("/reportes", reports::router())
}
