pub mod jwt;
pub mod multipart;
pub mod session;
pub mod unique_code;
