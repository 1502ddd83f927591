mod admin;
mod product;
mod review;
mod scan;
mod umkm;
mod views;

pub use admin::*;
pub use product::*;
pub use review::*;
pub use scan::*;
pub use umkm::*;
pub use views::*;
