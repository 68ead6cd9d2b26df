//! # 加密模块
//!
//! 基于密码的认证加密：PBKDF2-HMAC-SHA256 派生 256 位密钥，AES-256-GCM 加密并生成认证标签。
//!
//! 加密块布局：`salt (16) || nonce (12) || ciphertext || tag (16)`，
//! 离开本模块时以标准 base64 文本表示。

use crate::constants::{BLOB_OVERHEAD, DEFAULT_KDF_ITERATIONS, KEY_LEN, NONCE_LEN, SALT_LEN};
use crate::error::StegoError;
use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, KeyInit, generic_array::GenericArray},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use rand::RngCore;
use ring::pbkdf2;
use std::num::NonZeroU32;
use zeroize::Zeroizing;

/// 基于密码的加密器，持有 PBKDF2 的迭代次数。
#[derive(Debug, Clone, Copy)]
pub struct CryptoBox {
    iterations: NonZeroU32,
}

impl Default for CryptoBox {
    fn default() -> Self {
        Self::new(DEFAULT_KDF_ITERATIONS)
    }
}

impl CryptoBox {
    pub fn new(iterations: NonZeroU32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    /// 给定明文长度，返回原始加密块的字节数。
    pub fn blob_len(plain_len: usize) -> usize {
        BLOB_OVERHEAD + plain_len
    }

    /// 给定明文长度，返回 `encrypt` 输出的 base64 文本长度 (含填充)。
    pub fn encoded_len(plain_len: usize) -> usize {
        Self::blob_len(plain_len).div_ceil(3) * 4
    }

    fn derive_key(&self, password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            &mut *key,
        );
        debug!("Derived {}-byte key with {} PBKDF2 iterations", KEY_LEN, self.iterations);
        key
    }

    /// 加密明文，返回原始加密块 `salt || nonce || ciphertext || tag`。
    ///
    /// 每次调用都会重新生成盐值与 nonce。
    pub fn encrypt_raw(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let key = self.derive_key(password, &salt);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&key[..]));
        let sealed = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext)
            .map_err(|_| StegoError::Format("plaintext too large for AES-GCM".to_string()))?;

        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// 解密原始加密块。
    ///
    /// # Errors
    ///
    /// * 加密块短于固定开销时返回 [`StegoError::Format`]。
    /// * 认证标签校验失败时返回 [`StegoError::Authentication`]，不会返回任何部分明文。
    pub fn decrypt_raw(&self, blob: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        if blob.len() < BLOB_OVERHEAD {
            return Err(StegoError::Format(format!(
                "encrypted blob is {} bytes, shorter than the {}-byte header and tag",
                blob.len(),
                BLOB_OVERHEAD
            )));
        }

        let (salt, rest) = blob.split_at(SALT_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(password, salt);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&key[..]));
        cipher
            .decrypt(GenericArray::from_slice(nonce), sealed)
            .map_err(|_| StegoError::Authentication)
    }

    /// 加密明文并以 base64 文本返回加密块。
    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<String, StegoError> {
        self.encrypt_raw(plaintext, password)
            .map(|blob| STANDARD.encode(blob))
    }

    /// 解码 base64 文本并解密。
    ///
    /// # Errors
    ///
    /// 文本不是合法 base64 时返回 [`StegoError::Format`]，其余同 [`CryptoBox::decrypt_raw`]。
    pub fn decrypt(&self, encoded: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        let blob = STANDARD
            .decode(encoded)
            .map_err(|e| StegoError::Format(format!("encrypted blob is not valid base64: {e}")))?;
        self.decrypt_raw(&blob, password)
    }
}
