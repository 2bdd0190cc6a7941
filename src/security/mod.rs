//! Authentication and authorization

pub mod passwords;
pub mod permissions;
pub mod tokens;

// Re-export commonly used types
pub use passwords::{hash_password, verify_password, PasswordHash};
pub use permissions::{Permission, PermissionSet};
pub use tokens::{Claims, IssuedToken, TokenSigner};
