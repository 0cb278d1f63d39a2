pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reference;
pub mod reports;
pub mod users;
