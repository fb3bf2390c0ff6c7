//! 파이프라인 핵심 에러 타입.
//!
//! 어댑터 crate는 이 타입을 그대로 반환하며,
//! 바이너리는 `anyhow`로 한 번 더 감싼다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 스냅샷 수집, 변환, 적재, 설정 단계의 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정값 오류 (시작 시 치명적)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 업스트림 스냅샷 수집 실패
    #[error("스냅샷 수집 실패: {0}")]
    Fetch(String),

    /// 업스트림 응답 형식 오류 (주기 전체 폐기)
    #[error("잘못된 스냅샷: {0}")]
    MalformedSnapshot(String),

    /// 샘플 변환 실패 (해당 샘플만 폐기)
    #[error("샘플 변환 실패: player={player_id}: {reason}")]
    Conversion {
        /// 대상 플레이어 UUID
        player_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 백엔드 쓰기 실패 (요청 거부, 용량 초과 등)
    #[error("백엔드 쓰기 실패: {0}")]
    Write(String),

    /// 인증 실패 (토큰 오류, 권한 없음)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (5xx)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 네트워크 에러 (연결 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("타임아웃: {timeout_ms}ms 초과")]
    Timeout {
        /// 초과된 타임아웃 (밀리초)
        timeout_ms: u64,
    },

    /// 버퍼 상한 초과로 포인트 폐기
    #[error("버퍼 상한 초과: {dropped}개 포인트 폐기")]
    CapacityExceeded {
        /// 폐기된 포인트 수
        dropped: usize,
    },

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 다음 주기 재시도로 복구 가능한 에러인지 판별
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Fetch(_)
                | CoreError::Write(_)
                | CoreError::RateLimit { .. }
                | CoreError::ServiceUnavailable(_)
                | CoreError::Network(_)
                | CoreError::Timeout { .. }
                | CoreError::Io(_)
        )
    }
}
