mod dto;
pub mod router;
