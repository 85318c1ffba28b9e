pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod faq_repo;
pub mod listener;
pub mod memory;
pub mod order_repo;
pub mod profile_repo;
pub mod settings_repo;

pub use app_config::Config;
pub use database::DbClient;
