pub mod font;
pub mod render;

pub use font::load_font;
pub use render::TaskRenderer;
