//! Role profile lifecycle: provisioning, role switches and history.

pub mod service;

pub use service::ProfileService;
