//! # LSB 统计分析模块
//!
//! 将每个颜色通道的 LSB 序列按固定大小分块，计算每块中置位 bit 的比例。
//! 加密数据所在区域的块均值趋近 0.5，未经修改的自然图像区域通常偏离 0.5。
//!
//! 本模块只返回数值结果，显示由调用方负责。

use crate::constants::CHANNELS_PER_PIXEL;
use image::RgbaImage;
use log::{info, warn};
use std::num::NonZeroUsize;

/// 块均值与 0.5 的距离在此范围内时，视为类随机块。
const RANDOM_LIKE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; CHANNELS_PER_PIXEL] = [Channel::Red, Channel::Green, Channel::Blue];

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

/// 单个通道的汇总统计。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSummary {
    pub blocks: usize,
    /// 所有块均值的平均值。
    pub mean: f64,
    /// 均值落在 `0.5 ± 0.05` 内的块所占比例。
    pub random_like: f64,
}

/// 分析结果：每个通道一条按块顺序排列的均值序列。
#[derive(Debug, Clone, PartialEq)]
pub struct LsbAnalysis {
    block_size: NonZeroUsize,
    means: [Vec<f64>; CHANNELS_PER_PIXEL],
}

impl LsbAnalysis {
    pub fn block_size(&self) -> NonZeroUsize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.means[0].len()
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.means[channel.index()]
    }

    pub fn summary(&self, channel: Channel) -> ChannelSummary {
        let means = self.channel(channel);
        if means.is_empty() {
            return ChannelSummary { blocks: 0, mean: 0.0, random_like: 0.0 };
        }

        let count = means.len() as f64;
        let random_like = means
            .iter()
            .filter(|&&m| (m - 0.5).abs() <= RANDOM_LIKE_TOLERANCE)
            .count();

        ChannelSummary {
            blocks: means.len(),
            mean: means.iter().sum::<f64>() / count,
            random_like: random_like as f64 / count,
        }
    }
}

/// 按行优先顺序收集各通道 LSB，并计算每块的均值。最后一块可能不满。
pub fn analyse(image: &RgbaImage, block_size: NonZeroUsize) -> LsbAnalysis {
    let pixels = image.width() as usize * image.height() as usize;
    if pixels < block_size.get() {
        warn!(
            "Image has {} pixels, fewer than one full block of {}",
            pixels, block_size
        );
    }

    let means = Channel::ALL.map(|channel| {
        let lsbs: Vec<u8> = image.pixels().map(|p| p.0[channel.index()] & 1).collect();
        lsbs.chunks(block_size.get())
            .map(|block| block.iter().map(|&b| f64::from(b)).sum::<f64>() / block.len() as f64)
            .collect::<Vec<f64>>()
    });

    let analysis = LsbAnalysis { block_size, means };
    info!(
        "Analysed {}x{} image into {} blocks per channel",
        image.width(),
        image.height(),
        analysis.block_count()
    );
    analysis
}
