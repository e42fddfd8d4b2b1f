pub mod classification;
pub mod story;
