//! Role and ownership predicates.
//!
//! [`has_project_access`] is the single authorization primitive every
//! resource handler must call before returning cross-tenant data. The
//! assignment set is fetched fresh from the datastore per decision, never
//! cached in the session.

use super::{SessionUser, UserKind};

/// True iff the session belongs to an admin.
#[must_use]
pub fn is_admin(session: &SessionUser) -> bool {
    session.kind == UserKind::Admin
}

/// Decides whether `session` may act on a resource belonging to `project_id`.
///
/// No session: denied. Admin: allowed unconditionally. Client: allowed only
/// when `project_id` is in the client's assigned-project set.
#[must_use]
pub fn has_project_access(
    session: Option<&SessionUser>,
    project_id: &str,
    assigned_project_ids: &[String],
) -> bool {
    let Some(session) = session else {
        return false;
    };

    if is_admin(session) {
        return true;
    }

    assigned_project_ids.iter().any(|id| id == project_id)
}
