//! 背景去除.
//!
//! 以多个尺度的高斯模糊模拟背景, 从帧中减去一定比例的背景, 再把全片拉伸到 8-bit 范围.
//! 为了加速, 背景在缩小 4 倍的图像上计算.

use crate::error::ConfigResult;
use crate::{FrameSlice, Movie};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use log::{info, warn};
use ndarray::{Array2, ArrayView2};

/// 浮点单通道图像. `image` 对浮点像素按 `[0, 1]` 截断.
type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// 缩小倍数.
const DOWNSCALE: usize = 4;

/// 模拟背景的高斯核标准差.
const SIGMAS: [f32; 3] = [5.0, 10.0, 20.0];

/// 8-bit 上限.
const PEAK_8BIT: f64 = 255.0;

fn to_image(a: ArrayView2<f64>) -> FloatImage {
    let (h, w) = a.dim();
    ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        Luma([a[(y as usize, x as usize)] as f32])
    })
}

fn from_image(img: &FloatImage) -> Array2<f64> {
    let (w, h) = img.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(i, j)| {
        img.get_pixel(j as u32, i as u32).0[0] as f64
    })
}

/// 背景去除器.
#[derive(Copy, Clone, Debug)]
pub struct BackgroundRemover {
    multiplier: f64,
}

impl Default for BackgroundRemover {
    fn default() -> Self {
        Self::new(crate::consts::BACKGROUND_MULTIPLIER)
    }
}

impl BackgroundRemover {
    /// 以背景减除系数初始化.
    #[inline]
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// 缩小后的前景: 帧除以 `peak` 后减去 `multiplier` 倍的模拟背景. 可能含负值.
    pub fn foreground(&self, frame: FrameSlice, peak: f64) -> Array2<f64> {
        let (h, w) = frame.shape();
        let unit = frame.data().map(|&v| (v as f64 / peak).clamp(0.0, 1.0));
        let small = imageops::resize(
            &to_image(unit.view()),
            (w / DOWNSCALE).max(1) as u32,
            (h / DOWNSCALE).max(1) as u32,
            FilterType::Triangle,
        );

        let mut background: Option<Array2<f64>> = None;
        for sigma in SIGMAS {
            let blurred = from_image(&imageops::blur(&small, sigma));
            background = Some(match background {
                None => blurred,
                Some(b) => ndarray::Zip::from(&b).and(&blurred).map_collect(|&x, &y| x.max(y)),
            });
        }

        let mut fg = from_image(&small);
        if let Some(b) = background {
            fg.zip_mut_with(&b, |v, &bg| *v -= self.multiplier * bg);
        }
        fg
    }

    /// 把缩小的前景按全片最大值 `top` 映射到 8-bit, 再放大回 `(h, w)`.
    fn restore(small: &Array2<f64>, top: f64, (h, w): (usize, usize)) -> Array2<i32> {
        let unit = small.map(|&v| ((v * PEAK_8BIT / top).trunc() / PEAK_8BIT).max(0.0));
        let big = imageops::resize(&to_image(unit.view()), w as u32, h as u32, FilterType::Triangle);
        from_image(&big).map(|&v| (v * PEAK_8BIT) as i32)
    }

    /// 去除整片背景. 输出强度位于 `0..=255`, 形状不变.
    ///
    /// 输入全不为正, 或去除后没有正的前景时, 输出全为 0.
    pub fn remove(&self, movie: &Movie) -> ConfigResult<Movie> {
        info!("Removing background from {} frames", movie.len());
        let (h, w) = movie.frame_shape();
        let zeros = || Movie::new(ndarray::Array3::zeros(movie.shape()));

        let peak = movie.data().iter().copied().max().unwrap_or(0) as f64;
        if peak <= 0.0 {
            warn!("Movie has no positive intensity, background removal yields zeros");
            return zeros();
        }

        let small = movie.map_frames(|_, frame| self.foreground(frame, peak));
        let top = small
            .iter()
            .flat_map(|s| s.iter())
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if !(top > 0.0) {
            warn!("No foreground left after background removal");
            return zeros();
        }
        Movie::from_frames(small.iter().map(|s| Self::restore(s, top, (h, w))))
    }
}
