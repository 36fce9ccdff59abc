pub mod maxrects;

pub use maxrects::MaxRectsBin;
