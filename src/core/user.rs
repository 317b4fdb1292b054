//! User administration and authentication.
//!
//! Every mutating operation requires an admin [`Actor`]. Passwords never reach the
//! store in plain text; see [`crate::core::access::hash_password`].

use crate::{
    config::settings::SeedUser,
    core::access::{Actor, hash_password, require_role, verify_password},
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::validation("Email cannot be empty"));
    }
    Ok(email.to_string())
}

/// Finds a user by exact email.
pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a user without an authorization check. `password_hash` must already be a digest.
pub(crate) async fn insert_user<C>(
    db: &C,
    email: String,
    password_hash: String,
    role: Role,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if find_by_email(db, &email).await?.is_some() {
        return Err(Error::DuplicateIdentity { email });
    }

    let user = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}

/// Registers a new account.
///
/// # Errors
/// Returns an error if:
/// - `actor` is not an admin
/// - The email is empty or already registered
/// - The password is empty
#[instrument(skip(db, actor, password), fields(actor = %actor.email))]
pub async fn register_user(
    db: &DatabaseConnection,
    actor: &Actor,
    email: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    require_role(actor, Role::Admin)?;
    let email = normalize_email(email)?;
    if password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }

    let created = insert_user(db, email, hash_password(password), role).await?;
    info!(user_id = created.id, role = %created.role, "User registered");
    Ok(created)
}

/// Lists every account in creation order.
pub async fn list_users(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<user::Model>> {
    require_role(actor, Role::Admin)?;
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes a user's role.
///
/// # Errors
/// Returns an error if `actor` is not an admin or the user does not exist.
#[instrument(skip(db, actor), fields(actor = %actor.email))]
pub async fn set_user_role(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: i64,
    role: Role,
) -> Result<user::Model> {
    require_role(actor, Role::Admin)?;
    let existing = get_user(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let mut active: user::ActiveModel = existing.into();
    active.role = Set(role);
    let updated = active.update(db).await?;
    info!(user_id, role = %role, "User role changed");
    Ok(updated)
}

/// Deletes a user. Deleting an id that does not exist is a no-op.
///
/// Returns whether a row was removed.
///
/// # Errors
/// Returns an error if `actor` is not an admin or tries to delete itself.
#[instrument(skip(db, actor), fields(actor = %actor.email))]
pub async fn delete_user(db: &DatabaseConnection, actor: &Actor, user_id: i64) -> Result<bool> {
    require_role(actor, Role::Admin)?;
    if actor.id == user_id {
        return Err(Error::validation("Cannot delete the signed-in account"));
    }

    let result = User::delete_by_id(user_id).exec(db).await?;
    let removed = result.rows_affected > 0;
    if removed {
        info!(user_id, "User deleted");
    }
    Ok(removed)
}

/// Checks an email/password pair and returns the matching actor.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] for an unknown email or a wrong password.
pub async fn authenticate(db: &DatabaseConnection, email: &str, password: &str) -> Result<Actor> {
    let Some(user) = find_by_email(db, email.trim()).await? else {
        warn!("Login attempt for unknown account");
        return Err(Error::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(Error::InvalidCredentials);
    }

    Ok(Actor::from(user))
}

/// Creates the configured default accounts when no user exists yet.
///
/// Returns how many accounts were created.
pub async fn seed_default_users(db: &DatabaseConnection, users: &[SeedUser]) -> Result<usize> {
    if User::find().count(db).await? > 0 || users.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    for seed in users {
        let email = normalize_email(&seed.email)?;
        insert_user(&txn, email, hash_password(&seed.password), seed.role).await?;
    }
    txn.commit().await?;

    info!(count = users.len(), "Seeded default users");
    Ok(users.len())
}
