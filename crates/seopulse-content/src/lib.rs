pub mod client;
pub mod error;
pub mod pagination;
pub mod retry;
pub mod types;

pub use client::{ContentClient, Drained};
pub use error::ContentError;
pub use types::{
    ApiCollection, ApiImage, ApiPage, ApiProduct, CollectionsPage, PagesPage, ProductsPage,
};
