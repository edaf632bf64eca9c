mod pending;
mod tokens;

pub use pending::PENDING_AUTHORIZATION_TTL_SECS;
pub use pending::PendingAuthorization;
pub use pending::PendingAuthorizations;
pub use tokens::InMemoryTokenStore;
pub use tokens::TokenStore;
