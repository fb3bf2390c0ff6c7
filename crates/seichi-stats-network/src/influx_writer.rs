//! InfluxDB v2 쓰기 어댑터.
//!
//! `POST {url}/api/v2/write?org=..&bucket=..&precision=s`
//! 본문은 line protocol, 설정에 따라 gzip 압축.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use seichi_stats_core::config::BackendCredentials;
use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::point::FlushBatch;
use seichi_stats_core::ports::compressor::{Compressor, ContentEncoding};
use seichi_stats_core::ports::point_writer::PointWriter;

use crate::compression::GzipCompressor;
use crate::http_error::{check_response, map_transport};
use crate::line_protocol::encode_batch;

/// InfluxDB 쓰기 클라이언트: `PointWriter` 포트 구현
pub struct InfluxWriter {
    client: reqwest::Client,
    write_url: Url,
    token: String,
    encoding: ContentEncoding,
    compressor: GzipCompressor,
    timeout: Duration,
}

impl InfluxWriter {
    /// 새 쓰기 클라이언트 생성
    pub fn new(
        credentials: &BackendCredentials,
        encoding: ContentEncoding,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut write_url = Url::parse(&format!(
            "{}/api/v2/write",
            credentials.url.trim_end_matches('/')
        ))
        .map_err(|e| CoreError::Config(format!("백엔드 URL 오류: {e}")))?;
        write_url
            .query_pairs_mut()
            .append_pair("org", &credentials.org)
            .append_pair("bucket", &credentials.bucket)
            .append_pair("precision", "s");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        Ok(Self {
            client,
            write_url,
            token: credentials.token.clone(),
            encoding,
            compressor: GzipCompressor::new(),
            timeout,
        })
    }

    /// 쓰기 요청 URL (토큰 미포함)
    pub fn write_url(&self) -> &str {
        self.write_url.as_str()
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    async fn write_batch(&self, batch: &FlushBatch) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = encode_batch(batch);
        let raw_len = body.len();
        let payload = self.compressor.compress(body.as_bytes(), self.encoding)?;

        let mut req = self
            .client
            .post(self.write_url.clone())
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(payload);
        if let Some(enc) = self.encoding.header_value() {
            req = req.header(reqwest::header::CONTENT_ENCODING, enc);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout, "백엔드 요청 실패"))?;
        check_response(resp).await?;

        debug!("배치 기록: {}개 포인트, {}바이트", batch.len(), raw_len);
        Ok(())
    }
}
