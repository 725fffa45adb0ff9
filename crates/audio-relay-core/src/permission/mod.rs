mod permission_state;
mod permission_store;

pub use {
    permission_state::PermissionState,
    permission_store::{FilePermissionStore, MemoryPermissionStore, PermissionStore},
};
