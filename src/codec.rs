//! # 载荷编解码模块
//!
//! 在字节序列与带长度前缀的比特序列之间相互转换。
//! 帧格式：4 字节大端序 `u32` 长度前缀，随后是数据字节；每个字节按最高位优先展开为 8 个 bit。

use crate::constants::LENGTH_PREFIX_BYTES;
use crate::error::StegoError;

/// 给定数据长度，返回 `decompose` 输出的比特数。
pub fn framed_bits(data_len: usize) -> usize {
    8 * (LENGTH_PREFIX_BYTES + data_len)
}

/// 将数据分解为带长度前缀的比特序列。
///
/// # Errors
///
/// 数据长度超出 `u32` 能表示的范围时返回 [`StegoError::Format`]。
pub fn decompose(data: &[u8]) -> Result<Vec<bool>, StegoError> {
    let len = u32::try_from(data.len()).map_err(|_| {
        StegoError::Format(format!(
            "payload of {} bytes does not fit a 32-bit length prefix",
            data.len()
        ))
    })?;

    let mut bits = Vec::with_capacity(framed_bits(data.len()));
    len.to_be_bytes()
        .iter()
        .chain(data)
        .for_each(|&byte| bits.extend((0..8).rev().map(|i| (byte >> i) & 1 == 1)));

    Ok(bits)
}

/// 将比特序列重新组装为数据。
///
/// 每 8 个 bit 组成一个字节 (最高位优先)，末尾不足 8 个的 bit 被丢弃；
/// 读取前 4 个字节作为长度 `n`，返回其后的 `n` 个字节，更多的数据被忽略。
///
/// # Errors
///
/// 如果不足 4 个字节，或可用字节少于 `4 + n`，返回 [`StegoError::Format`]。
pub fn assemble(bits: &[bool]) -> Result<Vec<u8>, StegoError> {
    let bytes: Vec<u8> = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit)))
        .collect();

    let Some((prefix, body)) = bytes.split_first_chunk::<LENGTH_PREFIX_BYTES>() else {
        return Err(StegoError::Format(format!(
            "bitstream holds {} bytes, too short for the length prefix",
            bytes.len()
        )));
    };

    let declared = u32::from_be_bytes(*prefix) as usize;
    body.get(..declared).map(<[u8]>::to_vec).ok_or_else(|| {
        StegoError::Format(format!(
            "length prefix declares {} bytes but only {} are available",
            declared,
            body.len()
        ))
    })
}
