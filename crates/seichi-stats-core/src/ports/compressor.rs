//! 압축 포트.
//!
//! 구현: `seichi-stats-network` crate (flate2)

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 요청 본문 인코딩
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// 무압축
    Identity,
    /// gzip (flate2)
    #[default]
    Gzip,
}

impl ContentEncoding {
    /// `Content-Encoding` 헤더 값 (무압축이면 None)
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            ContentEncoding::Identity => None,
            ContentEncoding::Gzip => Some("gzip"),
        }
    }
}

/// 요청 본문 압축 인터페이스
pub trait Compressor: Send + Sync {
    /// 데이터 압축
    fn compress(&self, data: &[u8], encoding: ContentEncoding) -> Result<Vec<u8>, CoreError>;
}
