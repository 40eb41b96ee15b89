mod credentials;
mod helpers;
mod middleware;
pub mod policy;

pub use credentials::{CredentialHasher, generate_session_token, is_well_formed_token};
pub use helpers::{TokenValidationError, extract_token_from_header};
pub use middleware::{AuthError, MaybeUser, RequireUser};
