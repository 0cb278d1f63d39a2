pub mod activities;
pub mod cart_lines;
pub mod carts;
pub mod categories;
pub mod discounts;
pub mod order_lines;
pub mod orders;
pub mod payment_methods;
pub mod payments;
pub mod products;
pub mod roles;
pub mod sea_orm_active_enums;
pub mod shipments;
pub mod shipping_companies;
pub mod subcategories;
pub mod users;

pub use activities::Entity as Activities;
pub use cart_lines::Entity as CartLines;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use discounts::Entity as Discounts;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use roles::Entity as Roles;
pub use shipments::Entity as Shipments;
pub use shipping_companies::Entity as ShippingCompanies;
pub use subcategories::Entity as SubCategories;
pub use users::Entity as Users;
