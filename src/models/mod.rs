pub mod detection_log;
pub mod user;
