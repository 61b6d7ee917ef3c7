//! Endpoint groups.
//!
//! Each group is a directory under `src/api/` with a `router.rs` exposing
//! `router()`. A group is only served when it is listed in [`ENDPOINTS`] and
//! its directory is present in the scanned API directory.

use crate::discovery::EndpointModule;

pub mod create_user;
pub mod get_detection_log;
pub mod get_test;
pub mod share_schema;

pub const ENDPOINTS: &[EndpointModule] = &[
    EndpointModule::new("create_user", create_user::router::router),
    EndpointModule::new("get_detection_log", get_detection_log::router::router),
    EndpointModule::new("get_test", get_test::router::router),
];
