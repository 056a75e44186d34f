pub mod catalog;
pub mod db;

pub use catalog::HttpCatalogAdapter;
pub use db::DbAdapter;
