//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, Idx3d};

pub use crate::data::slice::{
    FrameSlice, ImgWriteRaw, ImgWriteVis, LabelSlice, LabelSliceMut, OwnedLabelSlice,
};
pub use crate::data::{LabelMovie, Movie};

pub use crate::consts::gray::{BACKGROUND_1, BACKGROUND_2, CELLS, LUMEN};

pub use crate::config::{ArcLength, PipelineConfig};
pub use crate::error::{ConfigError, ExportError, FrameError};
pub use crate::export::{load_movie_npy, save_run};
pub use crate::pipeline::{FrameOutcome, Pipeline, RunOutput};
pub use crate::table::{MeasurementTable, Metric};
