use crate::{MergedView, RoleView};

/// Projects a merged view down to what `role` may see.
///
/// Every leaf of the result reports the permissions `role` holds over the
/// field, and keeps the value only if those permissions include Read;
/// otherwise the value is null. A role with no entry on a field holds no
/// permissions there. Any role string is accepted, and the merged view is
/// left untouched.
pub fn sanitize(view: &MergedView, role: &str) -> RoleView {
    view.map_leaves(|_, field| field.sanitize(role))
}
