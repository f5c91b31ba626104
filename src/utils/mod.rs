pub mod error;
pub mod logger;
pub mod status;
pub mod validation;
