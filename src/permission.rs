use crate::roles::{Role, RoleSet};
use crate::session::Principal;

/// Decides whether `principal` satisfies `required`.
///
/// Super admins pass every requirement, including an empty one. Everyone else
/// passes iff their role is listed. No principal never passes.
pub fn check(principal: Option<&Principal>, required: RoleSet) -> bool {
    match principal {
        None => false,
        Some(p) if p.role == Role::SuperAdmin => true,
        Some(p) => required.contains(p.role),
    }
}
