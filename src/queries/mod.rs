pub mod admin_queries;
pub mod product_queries;
pub mod review_queries;
pub mod scan_queries;
pub mod umkm_queries;
