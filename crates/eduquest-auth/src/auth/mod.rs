pub mod credentials;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod provider;
pub mod reconcile;
pub mod service;
pub mod session;
pub mod sweeper;

pub use credentials::{CredentialStore, NewUser, SeaCredentialStore, UserChanges};
pub use guard::{AccessGuard, AuthContext};
pub use jwt::{Claims, TokenError, TokenService};
pub use password::{hash_password, verify_password};
pub use provider::{ExternalProfile, GoogleProvider, IdentityProvider, ProviderError};
pub use reconcile::IdentityReconciler;
pub use service::{AuthOutcome, AuthService, ProfileUpdate};
pub use session::{hash_token, SeaSessionStore, SessionStore};
pub use sweeper::spawn_session_sweeper;
