/// Object storage for uploaded media.
pub mod media;
