pub mod backward;
pub mod forward;
pub mod geometry;
pub mod region;
pub mod roi_align;
