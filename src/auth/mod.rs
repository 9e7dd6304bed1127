pub mod authentication;
pub mod device;
pub mod user;

pub use authentication::*;
pub use device::*;
pub use user::*;
