//! Default-permission management for one project across the five object kinds.
//! Read side aggregates and queries; write side adds grants in one call and
//! removes them one tuple at a time.

mod model;
mod map;
mod wire;
mod aggregate;
mod writer;

pub use model::{CapabilityMode, ConfirmedGrant, GranteeType, ObjectKind};
pub use map::{Capabilities, GrantRef, GranteeGrants, KindGrants, PermissionMap};
pub use wire::{parse_grantee_capabilities, permissions_request, GranteeCapabilities};
pub use aggregate::DefaultPermissions;
pub use writer::{
    add_user_permission_to_project, delete_user_permission_from_project, GrantColumns, PermissionDelta,
    PermissionWriter,
};
