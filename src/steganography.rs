//! # 隐写核心模块
//!
//! 将加密后的载荷写入像素 R, G, B 通道的最低有效位，或从中读回。
//! 像素按行优先顺序 (自上而下、自左向右) 遍历，每个像素承载 3 个 bit，Alpha 通道保持不变。

use crate::codec::{assemble, decompose, framed_bits};
use crate::constants::{CHANNELS_PER_PIXEL, DEFAULT_OUTPUT_EXTENSION, LOSSLESS_EXTENSIONS, SAFETY_MARGIN_BITS};
use crate::crypto::CryptoBox;
use crate::error::StegoError;
use image::RgbaImage;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// 图像的 LSB 容量预算，每次调用时根据尺寸重新计算。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    width: u32,
    height: u32,
}

impl Capacity {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 全部 LSB 通道的 bit 数：`width * height * 3`，溢出时饱和到 `u64::MAX`。
    pub fn total_bits(&self) -> u64 {
        u64::from(self.width)
            .saturating_mul(u64::from(self.height))
            .saturating_mul(CHANNELS_PER_PIXEL as u64)
    }

    /// 扣除 4 KB 安全余量后可用的 bit 数。
    pub fn usable_bits(&self) -> u64 {
        self.total_bits().saturating_sub(SAFETY_MARGIN_BITS)
    }

    pub fn total_kb(&self) -> f64 {
        bits_to_kb(self.total_bits())
    }

    pub fn usable_kb(&self) -> f64 {
        bits_to_kb(self.usable_bits())
    }

    /// 判断 `required_bits` 是否能放入图像。
    ///
    /// 等价于 `required_bits / 8 / 1024 <= total_bits / 8 / 1024 - 4`，以整数运算避免浮点误差。
    pub fn fits(&self, required_bits: u64) -> bool {
        required_bits.saturating_add(SAFETY_MARGIN_BITS) <= self.total_bits()
    }
}

pub fn bits_to_kb(bits: u64) -> f64 {
    bits as f64 / 8.0 / 1024.0
}

/// 给定明文长度，返回嵌入所需的 bit 数 (已补齐到 3 的倍数)。
pub fn required_bits(payload_len: usize) -> u64 {
    let bits = framed_bits(CryptoBox::encoded_len(payload_len)) as u64;
    bits.next_multiple_of(CHANNELS_PER_PIXEL as u64)
}

/// 加密载荷并嵌入图像，返回一张新的隐写图像。
///
/// 源图像不会被修改；输出与源图像尺寸相同，嵌入结束后的像素原样复制。
///
/// # Errors
///
/// * 载荷超出容量时返回 [`StegoError::CapacityExceeded`]，此检查先于密钥派生和任何像素修改。
/// * 加密失败时返回对应错误。
pub fn embed(
    image: &RgbaImage,
    payload: &[u8],
    password: &str,
    crypto: &CryptoBox,
) -> Result<RgbaImage, StegoError> {
    let capacity = Capacity::of(image);
    let required = required_bits(payload.len());
    if !capacity.fits(required) {
        return Err(StegoError::CapacityExceeded {
            required_bits: required,
            available_bits: capacity.usable_bits(),
        });
    }

    let encoded = crypto.encrypt(payload, password)?;
    let mut bits = decompose(encoded.as_bytes())?;
    bits.resize(bits.len().next_multiple_of(CHANNELS_PER_PIXEL), false);
    debug_assert_eq!(bits.len() as u64, required);

    let mut stego = image.clone();
    stego
        .pixels_mut()
        .zip(bits.chunks_exact(CHANNELS_PER_PIXEL))
        .for_each(|(pixel, chunk)| {
            pixel
                .0
                .iter_mut()
                .zip(chunk)
                .for_each(|(channel, &bit)| *channel = (*channel & 0xFE) | u8::from(bit));
        });

    debug!(
        "Wrote {} bits into {} of {} pixels",
        bits.len(),
        bits.len() / CHANNELS_PER_PIXEL,
        image.width() as usize * image.height() as usize
    );
    info!(
        "Embedded {} payload bytes into {}x{} image",
        payload.len(),
        capacity.width,
        capacity.height
    );

    Ok(stego)
}

/// 从隐写图像中提取并解密载荷。
///
/// 图像损坏时，根据受损 bit 的位置可能得到两种错误之一：
/// 落在长度前缀上或使文本不再是合法 base64 时为 [`StegoError::Format`]，
/// 落在 base64 字符集之内时由 AEAD 标签校验发现，为 [`StegoError::Authentication`]。
/// 两种情况都不会返回任何明文。
///
/// # Errors
///
/// * 长度前缀或比特流格式错误，或提取出的文本不是合法 base64 时返回 [`StegoError::Format`]。
/// * 密码错误或图像数据损坏导致标签校验失败时返回 [`StegoError::Authentication`]。
pub fn extract(image: &RgbaImage, password: &str, crypto: &CryptoBox) -> Result<Vec<u8>, StegoError> {
    let bits: Vec<bool> = image
        .pixels()
        .flat_map(|pixel| &pixel.0[..CHANNELS_PER_PIXEL])
        .map(|&channel| channel & 1 == 1)
        .collect();
    debug!("Read {} LSBs from {}x{} image", bits.len(), image.width(), image.height());

    let encoded = assemble(&bits)?;
    let plaintext = crypto.decrypt(&encoded, password)?;

    info!("Extracted {} payload bytes", plaintext.len());
    Ok(plaintext)
}

/// 读取待隐藏的载荷文件。
pub fn read_payload(path: &Path) -> Result<Vec<u8>, StegoError> {
    Ok(fs::read(path)?)
}

/// 写出提取得到的载荷。
pub fn write_payload(path: &Path, payload: &[u8]) -> Result<(), StegoError> {
    fs::write(path, payload)?;
    Ok(())
}

/// 读取图像并转换为 RGBA8 像素网格。
pub fn open_rgba(path: &Path) -> Result<RgbaImage, StegoError> {
    Ok(image::open(path)?.to_rgba8())
}

fn is_lossless(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LOSSLESS_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// 确认输出路径使用无损格式；有损编码会破坏嵌入的数据。
pub fn ensure_lossless(path: &Path) -> Result<(), StegoError> {
    if is_lossless(path) {
        Ok(())
    } else {
        Err(StegoError::UnsupportedFormat(format!(
            "{} is not a lossless image format (use one of: {})",
            path.display(),
            LOSSLESS_EXTENSIONS.join(", ")
        )))
    }
}

/// 以无损格式保存图像，格式由扩展名决定。
pub fn save_lossless(image: &RgbaImage, path: &Path) -> Result<(), StegoError> {
    ensure_lossless(path)?;
    image.save(path)?;
    Ok(())
}

/// 生成默认输出路径：`<dir>/<stem>-stego.<ext>`。
///
/// 输入扩展名属于无损格式时沿用，否则使用 PNG。
pub fn default_stego_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = match image_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if is_lossless(image_path) => ext.to_string(),
        _ => DEFAULT_OUTPUT_EXTENSION.to_string(),
    };
    image_path.with_file_name(format!("{stem}-stego.{extension}"))
}
