pub mod filter;
pub mod image;
pub mod morph;
pub mod share;
pub mod tag;
pub mod taggable;

pub use filter::*;
pub use image::*;
pub use morph::*;
pub use share::*;
pub use tag::*;
pub use taggable::*;
