//! Startup session validation.
//!
//! Runs once per application start. A persisted access token is only
//! presence-checked by the session manager, so this is where it is actually
//! validated: fetch the profile, and on failure demote the client to
//! anonymous. This is the only path that silently logs a customer out.

use tracing::{debug, info, warn};

use crate::state::AppState;

/// Validate any persisted session and hydrate dependent state.
///
/// - Authenticated with no hydrated user: fetch the profile; on success
///   install the user snapshot, on failure log out and stay anonymous.
/// - Whenever a user ends up active, pull the remote wishlist (hydration
///   failures are contained and logged by the synchronizer).
/// - Anonymous: nothing to do.
pub async fn run(state: &AppState) {
    let session = state.session();

    if session.is_authenticated() && session.current_user().is_none() {
        match session.fetch_profile().await {
            Ok(user) => {
                info!(user = %user.display_name(), "restored session");
                session.set_current_user(user);
            }
            Err(e) => {
                warn!(error = %e, "stored session is no longer valid, logging out");
                session.logout();
            }
        }
    }

    if session.current_user().is_some() {
        state.wishlist().hydrate_from_remote(session).await;
    } else {
        debug!("starting anonymous");
    }
}
