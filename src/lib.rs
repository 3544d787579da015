//! Invoicing backend: customers, products, sales, PDF invoices, email dispatch.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod renderer;
pub mod services;
pub mod startup;
