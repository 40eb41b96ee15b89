mod server;
mod store;

pub use server::ServerConfig;
pub use store::{PasswordParams, StoreConfig};
