//! User accounts and login.

use crate::models::{Capability, Role, TournamentError, User};
use crate::store::Store;

/// Create a user with a fresh access token (admin only).
pub fn create_user<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    username: &str,
    role: Role,
) -> Result<User, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let user = store.insert_user(User::new(username.trim(), role))?;
    log::info!("Created user {} ({:?})", user.username, user.role);
    Ok(user)
}

/// Resolve an access token to the session capability. Done once per login.
pub fn login<S: Store + ?Sized>(store: &S, token: &str) -> Result<Capability, TournamentError> {
    let user = store
        .user_by_token(token.trim())?
        .ok_or(TournamentError::InvalidToken)?;
    log::info!("User {} logged in", user.username);
    Ok(user.capability())
}

/// Make sure an admin with `token` exists (start-up seeding).
pub fn ensure_admin<S: Store + ?Sized>(store: &S, token: &str) -> Result<User, TournamentError> {
    if let Some(user) = store.user_by_token(token)? {
        return Ok(user);
    }
    let mut admin = User::new("admin", Role::Admin);
    admin.token = token.to_string();
    let admin = store.insert_user(admin)?;
    log::info!("Seeded admin user");
    Ok(admin)
}
