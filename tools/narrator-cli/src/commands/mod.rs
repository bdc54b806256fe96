pub mod check;
pub mod info;
pub mod plan;
pub mod render;
pub mod subtitles;
pub mod validate;
pub mod voice;
