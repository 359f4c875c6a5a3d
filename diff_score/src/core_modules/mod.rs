pub mod band;
pub mod colormap;
pub mod difference_mapper;
pub mod field;
pub mod pixel;
pub mod smart_pixel;
pub mod utils;
