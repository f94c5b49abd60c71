//! 标签切片与强度帧对象的操作.

mod core;
mod save;

pub use core::{FrameSlice, LabelSlice, LabelSliceMut, OwnedLabelSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};
