//! 与图像无关的一维/几何基础算法.

mod curve;
mod knee;
mod raster;
mod smooth;

pub use curve::sort_curve;
pub use knee::{knee_cutoff, kneedle, Knee};
pub use raster::points_between;
pub use smooth::{nan_max, normalize_by_max, running_average};
