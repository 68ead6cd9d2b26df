//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`extract` 和 `analyse` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::analysis::{Channel, LsbAnalysis, analyse};
use crate::cli::{AnalyseArgs, ExtractArgs, HideArgs};
use crate::crypto::CryptoBox;
use crate::error::StegoError;
use crate::steganography::{
    Capacity, bits_to_kb, default_stego_path, embed, ensure_lossless, extract, open_rgba,
    read_payload, required_bits, save_lossless, write_payload,
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// 终端迷你折线图的最大宽度 (字符数)。
const SPARKLINE_WIDTH: usize = 64;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// 类随机块比例超过该值时，提示图像可能含有隐藏数据。
const SUSPICIOUS_RANDOM_LIKE: f64 = 0.5;

/// 目标文件已存在且未指定 `--force` 时拒绝继续。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn default_recovered_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image.with_file_name(format!("{stem}-recovered.bin"))
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和载荷文件、报告容量、调用核心函数加密并嵌入载荷，
/// 最后以无损格式写出隐写图像。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与密码的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出路径不是无损格式，或已存在且未指定 `--force`。
/// * 无法读取输入的图像或载荷文件。
/// * 图像没有足够的空间来隐藏加密后的载荷，此时不会写出任何文件。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_stego_path(&args.image));

    ensure_lossless(&dest).with_context(|| {
        format!(
            "Refusing to write the stego image to {}. \nLossy formats destroy the hidden data.",
            dest.to_string_lossy().red().bold()
        )
    })?;
    ensure_writable(&dest, args.force)?;

    let cover = open_rgba(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let payload = read_payload(&args.payload).with_context(|| {
        format!(
            "Unable to read payload file: {}",
            args.payload.to_string_lossy().red().bold()
        )
    })?;

    let capacity = Capacity::of(&cover);
    println!(
        "Input image size: {}x{} pixels.",
        capacity.width(),
        capacity.height()
    );
    println!(
        "Usable payload size: {} KB (of {:.2} KB total).",
        format!("{:.2}", capacity.usable_kb()).green().bold(),
        capacity.total_kb()
    );
    println!("Payload size: {:.3} KB.", payload.len() as f64 / 1024.0);
    println!(
        "Encrypted payload size: {:.3} KB.",
        bits_to_kb(required_bits(payload.len()))
    );

    let crypto = CryptoBox::new(args.kdf_iterations);
    let stego = match embed(&cover, &payload, &args.password, &crypto) {
        Err(StegoError::CapacityExceeded {
            required_bits,
            available_bits,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the payload. \nRequired: {} KB, Available: {} KB",
            format!("{:.3}", bits_to_kb(required_bits)).red().bold(),
            format!("{:.3}", bits_to_kb(available_bits)).green().bold()
        ),
        result => result.with_context(|| "Failed to hide the payload in the image.")?,
    };

    save_lossless(&stego, &dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The payload has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Extract' 命令的执行逻辑。
///
/// 负责读取隐写图像、提取并解密隐藏的载荷，最后将恢复的内容写入目标文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与密码的 `ExtractArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像文件。
/// * 图像中没有可识别的载荷，或密码错误、数据损坏导致认证失败。
/// * 无法写入到目标文件。
pub fn handle_extract(args: ExtractArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_recovered_path(&args.image));
    ensure_writable(&output, args.force)?;

    let stego = open_rgba(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    println!("Image size: {}x{} pixels.", stego.width(), stego.height());

    let crypto = CryptoBox::new(args.kdf_iterations);
    let payload = extract(&stego, &args.password, &crypto).with_context(|| {
        format!(
            "Failed to extract a payload from '{}'. \nThe image may not contain hidden data, the password may be wrong, or the file is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    write_payload(&output, &payload).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The payload has been successfully extracted and saved: {}",
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Analyse' 命令的执行逻辑。
///
/// 计算各通道的分块 LSB 均值并输出到终端：默认打印汇总与蓝色通道的折线图，
/// 指定 `--csv` 时输出全部块均值。不写出任何文件。
///
/// # Errors
///
/// 无法读取输入的图像文件时返回错误。
pub fn handle_analyse(args: AnalyseArgs) -> Result<()> {
    let image = open_rgba(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let analysis = analyse(&image, args.block_size);

    if args.csv {
        print!("{}", to_csv(&analysis));
        return Ok(());
    }

    println!("Image size: {}x{} pixels.", image.width(), image.height());
    println!(
        "Block size: {} pixels, {} blocks per channel.",
        analysis.block_size(),
        analysis.block_count()
    );

    for channel in Channel::ALL {
        let summary = analysis.summary(channel);
        let random_like = format!("{:.1}%", summary.random_like * 100.0);
        println!(
            "{:>5}: mean LSB {:.3}, random-like blocks {}",
            channel.name(),
            summary.mean,
            if summary.random_like > SUSPICIOUS_RANDOM_LIKE {
                random_like.red().bold()
            } else {
                random_like.green()
            }
        );
    }

    println!("Average LSB per block (blue):");
    println!("{}", sparkline(analysis.channel(Channel::Blue), SPARKLINE_WIDTH));

    Ok(())
}

fn to_csv(analysis: &LsbAnalysis) -> String {
    let mut out = String::from("block,red,green,blue\n");
    let [red, green, blue] = Channel::ALL.map(|channel| analysis.channel(channel));
    for (i, ((r, g), b)) in red.iter().zip(green).zip(blue).enumerate() {
        out.push_str(&format!("{i},{r:.4},{g:.4},{b:.4}\n"));
    }
    out
}

/// 将块均值压缩为至多 `width` 个字符的折线图，相邻块取平均。
fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let group = values.len().div_ceil(width);
    values
        .chunks(group)
        .map(|chunk| {
            let mean = chunk.iter().sum::<f64>() / chunk.len() as f64;
            let level = (mean.clamp(0.0, 1.0) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level]
        })
        .collect()
}
