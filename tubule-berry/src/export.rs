//! 结果的持久化存储.
//!
//! 影像与诊断图以 `.npy` 保存, 表格以制表符分隔的文本保存, 逐帧图片以 PNG 保存.

use crate::error::ExportResult;
use crate::pipeline::RunOutput;
use crate::table::MeasurementTable;
use crate::threshold::ThresholdSeries;
use crate::{ImgWriteRaw, ImgWriteVis, LabelMovie, Movie};
use log::info;
use ndarray::{Array3, Array4};
use ndarray_npy::{read_npy, ReadNpyError, ReadableElement, WriteNpyExt};
use num::ToPrimitive;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 将阈值序列以制表符分隔写出, 列为 `frame`, `threshold`, `smoothed_threshold`.
pub fn write_thresholds_tsv<W: Write>(series: &ThresholdSeries, w: &mut W) -> io::Result<()> {
    writeln!(w, "frame\tthreshold\tsmoothed_threshold")?;
    for (t, (raw, smoothed)) in series.raw.iter().zip(series.smoothed.iter()).enumerate() {
        writeln!(w, "{t}\t{raw}\t{smoothed}")?;
    }
    Ok(())
}

/// 将测量表保存到 `path`.
pub fn save_table<P: AsRef<Path>>(table: &MeasurementTable, path: P) -> ExportResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    table.write_tsv(&mut w)?;
    w.flush()?;
    Ok(())
}

/// 将阈值序列保存到 `path`.
pub fn save_thresholds<P: AsRef<Path>>(series: &ThresholdSeries, path: P) -> ExportResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_thresholds_tsv(series, &mut w)?;
    w.flush()?;
    Ok(())
}

/// 将数组保存为 `.npy`.
#[inline]
pub fn save_npy<P: AsRef<Path>, T: WriteNpyExt>(path: P, array: &T) -> ExportResult<()> {
    ndarray_npy::write_npy(path, array)?;
    Ok(())
}

/// 以元素类型 `T` 尝试读取. 类型不符时返回 `None`.
fn read_as<T: ReadableElement + ToPrimitive>(path: &Path) -> ExportResult<Option<Movie>> {
    match read_npy::<_, Array3<T>>(path) {
        Ok(a) => Ok(Some(Movie::from_array(a.view())?)),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// 从 `(t, h, w)` 的 `.npy` 文件读取影像. 支持常见的整数与浮点元素类型.
pub fn load_movie_npy<P: AsRef<Path>>(path: P) -> ExportResult<Movie> {
    let p = path.as_ref();
    let readers: [fn(&Path) -> ExportResult<Option<Movie>>; 5] = [
        read_as::<i32>,
        read_as::<u16>,
        read_as::<u8>,
        read_as::<i16>,
        read_as::<f32>,
    ];
    for read in readers {
        if let Some(movie) = read(p)? {
            return Ok(movie);
        }
    }
    let a: Array3<f64> = read_npy(p)?;
    Ok(Movie::from_array(a.view())?)
}

/// 第 `t` 帧图片的路径.
#[inline]
fn frame_path(dir: &Path, prefix: &str, t: usize) -> PathBuf {
    dir.join(format!("{prefix}_{t:04}.png"))
}

/// 逐帧保存标签 PNG. `vis` 为真时映射到易于区分的灰度, 否则按原值保存.
pub fn save_label_frames<P: AsRef<Path>>(
    masks: &LabelMovie,
    dir: P,
    prefix: &str,
    vis: bool,
) -> ExportResult<()> {
    for (t, slice) in masks.slice_iter().enumerate() {
        let path = frame_path(dir.as_ref(), prefix, t);
        if vis {
            slice.save(path)?;
        } else {
            slice.save_raw(path)?;
        }
    }
    Ok(())
}

/// 逐帧保存 `(t, h, w, 3)` 的 RGB 诊断图.
pub fn save_rgb_frames<P: AsRef<Path>>(rgb: &Array4<u8>, dir: P, prefix: &str) -> ExportResult<()> {
    let &[_, h, w, _] = rgb.shape() else {
        unreachable!()
    };
    for (t, frame) in rgb.outer_iter().enumerate() {
        let img = image::RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let (i, j) = (y as usize, x as usize);
            image::Rgb([frame[(i, j, 0)], frame[(i, j, 1)], frame[(i, j, 2)]])
        });
        img.save(frame_path(dir.as_ref(), prefix, t))?;
    }
    Ok(())
}

/// 逐帧保存 `(t, h, w)` 的单通道图.
pub fn save_gray_frames<P: AsRef<Path>>(gray: &Array3<u8>, dir: P, prefix: &str) -> ExportResult<()> {
    let &[_, h, w] = gray.shape() else {
        unreachable!()
    };
    for (t, frame) in gray.outer_iter().enumerate() {
        let img = image::GrayImage::from_fn(w as u32, h as u32, |x, y| {
            image::Luma([frame[(y as usize, x as usize)]])
        });
        img.save(frame_path(dir.as_ref(), prefix, t))?;
    }
    Ok(())
}

/// 将一次运行的全部输出写入 `dir`, 文件名以 `prefix` 开头.
///
/// | 文件 | 内容 |
/// | --- | --- |
/// | `{prefix}_clean.npy` | 背景去除后的影像 (若有) |
/// | `{prefix}_thresholds.tsv` | 阈值序列 (若有) |
/// | `{prefix}_mask.npy` | 掩码序列 |
/// | `{prefix}_mask-diagnostics.npy` | 掩码诊断图 (若有) |
/// | `{prefix}_measurements.tsv` | 测量表 |
/// | `{prefix}_measurements-diagnostics.npy` | 测量诊断图 |
pub fn save_run<P: AsRef<Path>>(output: &RunOutput, dir: P, prefix: &str) -> ExportResult<()> {
    let dir = dir.as_ref();
    let path = |name: &str| dir.join(format!("{prefix}_{name}"));
    info!("Saving results to {}", dir.display());

    if let Some(cleaned) = &output.cleaned {
        save_npy(path("clean.npy"), &cleaned.data())?;
    }
    if let Some(series) = &output.thresholds {
        save_thresholds(series, path("thresholds.tsv"))?;
    }
    save_npy(path("mask.npy"), &output.masks.data())?;
    if let Some(rgb) = &output.mask_diagnostics {
        save_npy(path("mask-diagnostics.npy"), rgb)?;
    }
    save_table(&output.table, path("measurements.tsv"))?;
    save_npy(
        path("measurements-diagnostics.npy"),
        &output.measurement_diagnostics,
    )?;
    Ok(())
}
