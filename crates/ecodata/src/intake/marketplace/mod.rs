//! Add-on module catalogue and purchases.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{MarketplaceProduct, ProductQuery, PurchaseReceipt, PurchaseRequest};
pub use repository::ProductRepository;
pub use router::marketplace_router;
pub use service::MarketplaceService;
