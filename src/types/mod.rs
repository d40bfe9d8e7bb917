mod quality;
mod source;
mod video;

pub use quality::{Quality, is_junk_release};
pub use source::Source;
pub use video::{ExternalIds, Video, VideoType};
