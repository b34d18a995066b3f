pub mod image;
pub mod request;
pub mod session;
pub mod wire;

pub use image::*;
pub use request::*;
pub use session::*;
pub use wire::*;
