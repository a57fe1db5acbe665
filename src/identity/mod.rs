//! Who the current user is: server session, recovered guest or fresh guest.
//! Storage, the backend session cache and the login bridge each live in their
//! own file; the reconciler is the only piece that ties them together.

mod model;
mod request_context;
mod session;
mod store;
mod bridge;
mod reconciler;

pub use model::{AuthCredential, Identity, GUEST_DISPLAY_NAME};
pub use request_context::{user_headers, USER_ID_HEADER};
pub use session::SessionQuery;
pub use store::{FileIdentityStore, IdentityStore, MemoryIdentityStore};
pub use bridge::SessionBridge;
pub use reconciler::{IdentityReconciler, ReconcilePhase};
