pub mod listings;
pub mod valuations;
