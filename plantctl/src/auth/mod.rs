//! Authentication and authorization.
//!
//! Two ways to present a session token, both JWTs signed with the
//! configured `secret_key`:
//!
//! - `Authorization: Bearer <token>` for programmatic clients
//! - an HTTP-only session cookie for browsers, set on login/register
//!
//! Authorization is role-based: admins can do everything, standard users
//! can read the whole catalogue and act on the records they own. See
//! [`permissions`] for the rules and the [`permissions::RequiresPermission`]
//! route guard.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Permission checking and access control logic
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
