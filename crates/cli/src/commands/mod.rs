pub mod build;
pub mod preview;
