pub mod photos;
pub mod system;
