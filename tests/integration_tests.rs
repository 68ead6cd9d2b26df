use image::{ImageBuffer, Rgba, RgbaImage};
use lsb_crypt::{
    analysis::{Channel, analyse},
    cli::{AnalyseArgs, ExtractArgs, HideArgs},
    constants::DEFAULT_BLOCK_SIZE,
    crypto::CryptoBox,
    handler::{handle_analyse, handle_extract, handle_hide},
    steganography::embed,
};
use rand::RngCore;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 测试中使用较低的 PBKDF2 迭代次数以加快速度
fn test_iterations() -> NonZeroU32 {
    NonZeroU32::new(1_000).unwrap()
}

/// 一个辅助函数，用于创建一个带有随机像素的测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut img_buf = ImageBuffer::new(width, height);
    let mut raw_pixels = vec![0u8; (width * height * 4) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    img_buf
        .pixels_mut()
        .zip(raw_pixels.chunks_exact(4))
        .for_each(|(pixel, chunk)| {
            *pixel = Rgba([chunk[0], chunk[1], chunk[2], 255]);
        });

    img_buf.save(path).expect("Failed to create test image.");
}

fn hide_args(image: &Path, payload: &Path, dest: Option<PathBuf>, password: &str) -> HideArgs {
    HideArgs {
        image: image.to_path_buf(),
        payload: payload.to_path_buf(),
        dest,
        password: password.to_string(),
        kdf_iterations: test_iterations(),
        force: false,
    }
}

fn extract_args(image: &Path, output: Option<PathBuf>, password: &str) -> ExtractArgs {
    ExtractArgs {
        image: image.to_path_buf(),
        output,
        password: password.to_string(),
        kdf_iterations: test_iterations(),
        force: false,
    }
}

/// 验证从隐藏到提取的完整流程
#[test]
fn test_handle_hide_and_extract_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let hidden_image_path = dir.path().join("hidden.png");
    let source_path = dir.path().join("source.bin");
    let recovered_path = dir.path().join("recovered.bin");

    create_test_image(&original_image_path, 200, 200);
    let mut original_payload = "Binary payload for the handler! 这是一个给处理器的测试信息！"
        .as_bytes()
        .to_vec();
    original_payload.extend([0x00, 0xFF, 0x80, 0x7F]);
    fs::write(&source_path, &original_payload)?;

    // 2. 测试 handle_hide
    handle_hide(hide_args(
        &original_image_path,
        &source_path,
        Some(hidden_image_path.clone()),
        "pw123",
    ))?;
    assert!(hidden_image_path.exists(), "Hidden image should be created.");

    let original = image::open(&original_image_path)?.to_rgba8();
    let hidden = image::open(&hidden_image_path)?.to_rgba8();
    assert_eq!(original.dimensions(), hidden.dimensions());

    // 3. 测试 handle_extract
    handle_extract(extract_args(
        &hidden_image_path,
        Some(recovered_path.clone()),
        "pw123",
    ))?;
    assert!(recovered_path.exists(), "Recovered file should be created.");

    // 4. 验证结果
    let recovered = fs::read(&recovered_path)?;
    assert_eq!(
        original_payload, recovered,
        "Recovered payload must match the original."
    );

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_extract_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let source_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 200, 200);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_path, original_text)?;

    // 2. 测试 handle_hide，不提供 dest 路径
    handle_hide(hide_args(&original_image_path, &source_path, None, "secret"))?;

    let expected_hidden_path = dir.path().join("original-stego.png");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_extract，不提供输出路径
    handle_extract(extract_args(&expected_hidden_path, None, "secret"))?;

    let expected_recovered_path = dir.path().join("original-stego-recovered.bin");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let payload_path = dir.path().join("payload.txt");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 200, 200);
    fs::write(&payload_path, "some text")?;

    // 2. 场景一：测试覆盖保护
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;
    assert!(dest_path.exists());

    let result = handle_hide(hide_args(
        &image_path,
        &payload_path,
        Some(dest_path.clone()),
        "pw",
    ));
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 3. 场景二：测试强制覆盖
    let mut forced = hide_args(&image_path, &payload_path, Some(dest_path.clone()), "pw");
    forced.force = true;
    let result = handle_hide(forced);
    assert!(
        result.is_ok(),
        "Execution should succeed with --force when file exists."
    );

    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    // 4. 提取同样受覆盖保护
    let recovered_path = dir.path().join("recovered.bin");
    fs::write(&recovered_path, "keep me")?;
    let result = handle_extract(extract_args(&dest_path, Some(recovered_path.clone()), "pw"));
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&recovered_path)?, "keep me");

    Ok(())
}

/// 验证空间不足时的错误处理，且不会写出任何文件
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("small.png");
    let payload_path = dir.path().join("hi.txt");
    let dest_path = dir.path().join("dest.png");

    // 10x10 像素只有 300 bit 容量，连 "hi" 的加密结果也放不下
    create_test_image(&image_path, 10, 10);
    fs::write(&payload_path, "hi")?;

    // 2. 执行并断言错误
    let result = handle_hide(hide_args(
        &image_path,
        &payload_path,
        Some(dest_path.clone()),
        "pw",
    ));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output should be written.");

    Ok(())
}

/// 验证有损格式的输出路径会被拒绝
#[test]
fn test_lossy_destination_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let payload_path = dir.path().join("payload.txt");
    let dest_path = dir.path().join("dest.jpg");

    create_test_image(&image_path, 200, 200);
    fs::write(&payload_path, "lossy")?;

    let result = handle_hide(hide_args(
        &image_path,
        &payload_path,
        Some(dest_path.clone()),
        "pw",
    ));
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Refusing to write"));
    }
    assert!(!dest_path.exists());

    Ok(())
}

/// 验证错误密码无法提取，且不会写出任何文件
#[test]
fn test_extract_with_wrong_password() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let payload_path = dir.path().join("payload.txt");
    let hidden_path = dir.path().join("hidden.png");
    let recovered_path = dir.path().join("recovered.bin");

    create_test_image(&image_path, 200, 200);
    fs::write(&payload_path, "top secret")?;
    handle_hide(hide_args(
        &image_path,
        &payload_path,
        Some(hidden_path.clone()),
        "right",
    ))?;

    let result = handle_extract(extract_args(
        &hidden_path,
        Some(recovered_path.clone()),
        "wrong",
    ));
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(format!("{e:#}").contains("authentication failed"));
    }
    assert!(!recovered_path.exists());

    Ok(())
}

/// 验证 analyse 命令能处理隐写图像，包括 CSV 输出
#[test]
fn test_handle_analyse() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    create_test_image(&image_path, 120, 90);

    for csv in [false, true] {
        handle_analyse(AnalyseArgs {
            image: image_path.clone(),
            block_size: DEFAULT_BLOCK_SIZE,
            csv,
        })?;
    }

    let missing = handle_analyse(AnalyseArgs {
        image: dir.path().join("missing.png"),
        block_size: DEFAULT_BLOCK_SIZE,
        csv: false,
    });
    assert!(missing.is_err());

    Ok(())
}

/// 验证分析结果能区分嵌入区域与未修改区域
#[test]
fn test_analysis_reveals_embedded_region() -> anyhow::Result<()> {
    // 所有 LSB 为 0 的平坦图像
    let cover = RgbaImage::from_pixel(200, 200, Rgba([0x80, 0x40, 0x20, 0xFF]));
    let mut payload = vec![0u8; 4000];
    rand::rng().fill_bytes(&mut payload);

    let stego = embed(&cover, &payload, "pw", &CryptoBox::new(test_iterations()))?;
    let analysis = analyse(&stego, DEFAULT_BLOCK_SIZE);
    assert_eq!(analysis.block_count(), 400);

    for channel in Channel::ALL {
        let means = analysis.channel(channel);
        let head = &means[..100];
        let head_mean = head.iter().sum::<f64>() / head.len() as f64;
        assert!(
            (head_mean - 0.5).abs() < 0.1,
            "{channel:?} embedded region mean {head_mean}"
        );
        assert!(means[200..].iter().all(|&m| m == 0.0));
    }

    Ok(())
}
