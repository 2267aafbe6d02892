pub mod bearer;
pub mod factory;
pub mod gate;
pub mod principal;
pub mod revocation;
pub mod route_marker;
pub mod verifier;

pub use factory::build_access_gate;
pub use gate::{AccessDenied, AccessGate, GateOutcome, GatePolicy};
pub use principal::{LookupError, Principal, PrincipalLookup};
pub use route_marker::{Access, RouteKey, RouteMarkers};
pub use verifier::{JwtVerifier, SubjectId, TokenVerifier, VerifiedClaims, VerifyError};
