pub mod bootstrap;
mod dto;
mod error;
pub mod logging;
pub mod routes;

pub use bootstrap::{run_server, ServerConfig};
pub use dto::{AccountResponse, ProofResponse, RootResponse, TransferRequest};
pub use error::ApiError;
pub use routes::{ServerContext, TransferServer};
