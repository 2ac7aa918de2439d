pub mod image;
pub mod query;
pub mod share;
pub mod tag;
pub mod tag_tree;
pub mod taggable;

pub use image::ImageRepository;
pub use share::ShareRepository;
pub use tag::TagRepository;
pub use tag_tree::TagHierarchy;
pub use taggable::TaggableRepository;
