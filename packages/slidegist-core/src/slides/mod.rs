pub mod render;
pub mod segmenter;

pub use render::{highlight_stylesheet, render, render_all, render_slide};
pub use segmenter::{is_slide_boundary, segment, slide_at, slide_count, slide_title};
