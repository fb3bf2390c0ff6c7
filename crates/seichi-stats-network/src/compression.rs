//! 요청 본문 압축 어댑터.
//!
//! `Compressor` 포트 구현. gzip(flate2) 또는 무압축.

use flate2::read::GzEncoder;
use flate2::Compression;
use seichi_stats_core::error::CoreError;
use seichi_stats_core::ports::compressor::{Compressor, ContentEncoding};
use std::io::Read;

/// gzip 압축기: `Compressor` 포트 구현
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// 기본 압축 레벨로 생성
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8], encoding: ContentEncoding) -> Result<Vec<u8>, CoreError> {
        match encoding {
            ContentEncoding::Identity => Ok(data.to_vec()),
            ContentEncoding::Gzip => {
                let mut encoder = GzEncoder::new(data, self.level);
                let mut compressed = Vec::new();
                encoder
                    .read_to_end(&mut compressed)
                    .map_err(|e| CoreError::Internal(format!("gzip 압축 실패: {e}")))?;
                Ok(compressed)
            }
        }
    }
}
