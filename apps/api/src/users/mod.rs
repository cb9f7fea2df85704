pub mod handlers;
pub mod postgres;
pub mod store;
