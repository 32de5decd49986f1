//! Authentication state trait.

use crate::jwt::JwtConfig;

/// Trait for router state types that expose the JWT configuration to the
/// auth extractors.
pub trait HasAuthState {
    fn jwt(&self) -> &JwtConfig;
}
