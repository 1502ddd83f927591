pub mod media_service;
pub mod qr_service;
pub mod review_service;
pub mod storage_service;
