pub mod error;
pub mod files;
pub mod flash;
pub mod gallery;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use gallery::GalleryService;
pub use routes::{create_router, AppState};
pub use server::Server;
