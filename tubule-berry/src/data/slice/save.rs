//! 图像的持久化存储.

use crate::{LabelSlice, LabelSliceMut};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 标签切片只有 0, 1, 2, 3 四种像素值, 直接保存时肉眼几乎无法区分,
/// 因此保存前会映射到差异明显的灰度.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
pub(crate) fn pretty(label: u8) -> u8 {
    use crate::consts::gray::*;
    match label {
        // 两个背景都偏暗, 但可区分
        BACKGROUND_1 => BLACK,
        BACKGROUND_2 => DARK_GRAY,

        // 细胞组织居中
        CELLS => GRAY,

        // 管腔最亮
        LUMEN => WHITE,

        any_else => panic!("只允许图像存在 0, 1, 2, 3 像素, 但发现了 `{any_else}`"),
    }
}

macro_rules! impl_label_vis {
    ($($slice: ty),+) => {
        $(
            /// 会将背景 1/背景 2/细胞/管腔像素分别映射为黑色/暗灰色/灰色/白色. 不允许其他颜色.
            impl ImgWriteVis for $slice {
                fn save<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

macro_rules! impl_label_raw {
    ($($slice: ty),+) => {
        $(
            /// 按原样存储.
            impl ImgWriteRaw for $slice {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_label_vis!(LabelSlice<'_>, LabelSliceMut<'_>);
impl_label_raw!(LabelSlice<'_>, LabelSliceMut<'_>);

#[cfg(test)]
mod tests {
    use super::pretty;
    use crate::consts::gray::*;

    #[test]
    fn test_pretty_is_injective() {
        let mut shades = [CELLS, BACKGROUND_1, BACKGROUND_2, LUMEN].map(pretty);
        shades.sort_unstable();
        assert!(shades.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    #[should_panic]
    fn test_pretty_rejects_unknown() {
        pretty(DIAG_PROFILE);
    }
}
