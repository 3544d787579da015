//! Domain models for the invoicing backend.

mod customer;
mod product;
mod sale;
mod sale_item;

pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use product::{CreateProduct, Product, UpdateProduct};
pub use sale::{CreateSale, Sale, SaleDetail};
pub use sale_item::{CreateSaleItem, SaleItem};
