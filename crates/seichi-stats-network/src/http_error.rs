//! HTTP 응답/전송 에러 매핑.

use reqwest::StatusCode;
use seichi_stats_core::error::CoreError;
use std::time::Duration;

/// Retry-After 헤더가 없을 때의 기본 대기 시간 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 응답 상태 코드 확인 및 에러 매핑
///
/// 401/403 → Auth, 429 → RateLimit, 503·5xx → ServiceUnavailable, 그 외 4xx → Write
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();

    if status.is_success() {
        return Ok(resp);
    }

    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let text = resp.text().await.unwrap_or_else(|e| {
        tracing::warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });

    Err(map_status(status, retry_after, text))
}

/// 상태 코드 → 에러 변환
pub fn map_status(status: StatusCode, retry_after: Option<u64>, text: String) -> CoreError {
    match status.as_u16() {
        401 | 403 => CoreError::Auth(format!("인증 실패 ({status}): {text}")),
        429 => CoreError::RateLimit {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        400..=499 => CoreError::Write(format!("요청 거부 ({status}): {text}")),
        _ => CoreError::ServiceUnavailable(format!("({status}) {text}")),
    }
}

/// reqwest 전송 에러 변환
pub fn map_transport(err: reqwest::Error, timeout: Duration, context: &str) -> CoreError {
    if err.is_timeout() {
        CoreError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        CoreError::Network(format!("{context}: {err}"))
    }
}
