use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, UpdateCartLineRequest},
        catalog::{
            CreateCategoryRequest, CreateDiscountRequest, CreateProductRequest,
            CreateSubCategoryRequest, UpdateCategoryRequest, UpdateDiscountRequest,
            UpdateProductRequest,
        },
        orders::{
            AddOrderLineRequest, CreateOrderRequest, CreatePaymentRequest, CreateShipmentRequest,
            OrderLineInput, OrderWithLines, UpdateOrderStateRequest, UpdatePaymentStateRequest,
            UpdateShipmentStateRequest,
        },
        reference::{CreatePaymentMethodRequest, CreateShippingCompanyRequest},
        reports::{
            ActiveUser, CancellationMetrics, CostMarginRow, Granularity, MonthlyCancellation,
            ProductSeasonality, SalesBucket,
        },
        users::{ChangePasswordRequest, ChangeRoleRequest, UpdateProfileRequest},
    },
    entity::sea_orm_active_enums::{
        ActivityType, CartState, DiscountKind, OrderState, PaymentMethodKind, PaymentState,
        ShipmentState,
    },
    models::{
        Activity, Cart, CartLine, Category, Discount, Order, OrderLine, Payment, PaymentMethod,
        Product, Role, Shipment, ShippingCompany, SubCategory, User,
    },
    response::{ApiResponse, Meta, Page},
    routes::{
        activities, auth, cart, catalog, discounts, health, orders, params, reference, reports,
        shipments, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::get_me,
        users::update_profile,
        users::change_password,
        users::change_role,
        users::list_roles,
        catalog::list_categories,
        catalog::create_category,
        catalog::get_category,
        catalog::update_category,
        catalog::delete_category,
        catalog::list_subcategories,
        catalog::create_subcategory,
        catalog::list_products,
        catalog::get_product,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        catalog::list_product_discounts,
        discounts::list_discounts,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        reference::list_payment_methods,
        reference::create_payment_method,
        reference::list_shipping_companies,
        reference::create_shipping_company,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::checkout,
        orders::list_orders,
        orders::list_all_orders,
        orders::create_order,
        orders::checkout,
        orders::get_order,
        orders::update_order_state,
        orders::cancel_order,
        orders::list_order_lines,
        orders::add_order_line,
        shipments::list_shipments,
        shipments::create_shipment,
        shipments::get_shipment,
        shipments::update_shipment_state,
        shipments::list_payments,
        shipments::create_payment,
        shipments::get_payment,
        shipments::update_payment_state,
        activities::list_activities,
        reports::sales_by_period,
        reports::seasonality,
        reports::cost_margin,
        reports::cancellations,
        reports::most_active_users,
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            SubCategory,
            Product,
            Discount,
            PaymentMethod,
            ShippingCompany,
            Cart,
            CartLine,
            Order,
            OrderLine,
            Shipment,
            Payment,
            Activity,
            CartState,
            OrderState,
            ShipmentState,
            PaymentState,
            PaymentMethodKind,
            DiscountKind,
            ActivityType,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            ChangeRoleRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateSubCategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            CreateDiscountRequest,
            UpdateDiscountRequest,
            CreatePaymentMethodRequest,
            CreateShippingCompanyRequest,
            AddToCartRequest,
            UpdateCartLineRequest,
            CartView,
            OrderLineInput,
            CreateOrderRequest,
            AddOrderLineRequest,
            UpdateOrderStateRequest,
            OrderWithLines,
            CreateShipmentRequest,
            UpdateShipmentStateRequest,
            CreatePaymentRequest,
            UpdatePaymentStateRequest,
            Granularity,
            SalesBucket,
            ProductSeasonality,
            CostMarginRow,
            MonthlyCancellation,
            CancellationMetrics,
            ActiveUser,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            Page<Product>,
            Page<Order>,
            ApiResponse<Product>,
            ApiResponse<OrderWithLines>,
            ApiResponse<CartView>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Profiles and roles"),
        (name = "Catalog", description = "Categories, subcategories and products"),
        (name = "Discounts", description = "Product and payment method discounts"),
        (name = "Reference", description = "Payment methods and shipping companies"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Fulfilment", description = "Shipments and payments"),
        (name = "Activity", description = "Activity log"),
        (name = "Reports", description = "Administrative reports"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/usuarios/registro",
            "/productos",
            "/carritos/lineas",
            "/pedidos/{id}/estado",
            "/pedido-detalles",
            "/envios",
            "/pagos",
            "/reportes/ventas",
            "/actividades",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
