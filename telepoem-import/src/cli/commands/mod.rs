pub mod import;
pub mod link_audio;
pub mod split;
