//! 애플리케이션 설정 구조체.
//!
//! 업스트림, 폴링 주기, 버퍼 상한, 백엔드 자격증명, 피드 서버 설정을 정의한다.
//! `config` crate를 통해 `SEICHI_STATS_` 접두사 환경변수에서 로드하며,
//! 중첩 키는 `__`로 구분한다 (예: `SEICHI_STATS_BACKEND__TOKEN`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

use crate::error::CoreError;
use crate::models::statistic::StatisticKind;
use crate::ports::compressor::ContentEncoding;

/// 환경변수 접두사
pub const ENV_PREFIX: &str = "SEICHI_STATS";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 샘플의 `host` 태그 값
    #[serde(default = "default_source_host")]
    pub source_host: String,
    /// 포인트의 `source` 태그 값
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// 업스트림 게임 데이터 서비스 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 폴링 주기 설정
    #[serde(default)]
    pub poll: PollConfig,
    /// 버퍼/플러시 설정
    #[serde(default)]
    pub buffer: BufferConfig,
    /// 시계열 백엔드 설정
    #[serde(default)]
    pub backend: BackendConfig,
    /// pull 피드 서버 설정
    #[serde(default)]
    pub exporter: ExporterConfig,
}

// ============================================================
// 업스트림/폴링
// ============================================================

/// 업스트림 게임 데이터 서비스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// `ReadService` gRPC 엔드포인트 (필수, 예: `http://game-data:50051`)
    #[serde(default)]
    pub grpc_endpoint: Option<String>,
    /// 스냅샷 전체 수집 타임아웃 (초)
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
    /// 수집할 통계 종류 (쉼표 구분)
    #[serde(default = "default_kinds")]
    pub kinds: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            grpc_endpoint: None,
            timeout_secs: default_upstream_timeout_secs(),
            kinds: default_kinds(),
        }
    }
}

impl UpstreamConfig {
    /// 설정된 통계 종류 목록 (공백/빈 항목 제거)
    pub fn statistic_kinds(&self) -> Vec<StatisticKind> {
        self.kinds
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(StatisticKind::new)
            .collect()
    }
}

/// 폴링 주기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// 수집 주기 (초)
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// 주기마다 더하는 무작위 지연 상한 (초)
    #[serde(default = "default_poll_jitter_secs")]
    pub jitter_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            jitter_secs: default_poll_jitter_secs(),
        }
    }
}

// ============================================================
// 버퍼/백엔드
// ============================================================

/// 버퍼/플러시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// 배치 최대 포인트 수
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 미전송 포인트 상한 (초과 시 오래된 것부터 폐기)
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: usize,
    /// 플러시 주기 (초)
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// 플러시 무작위 지연 상한 (초)
    #[serde(default)]
    pub flush_jitter_secs: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            buffer_limit: default_buffer_limit(),
            flush_interval_secs: default_flush_interval_secs(),
            flush_jitter_secs: 0,
        }
    }
}

/// 시계열 백엔드 설정
///
/// 자격증명은 기본값이 없으며 `validate()`에서 누락 시 실패한다.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// 백엔드 URL (예: "http://influxdb:8086")
    #[serde(default)]
    pub url: Option<String>,
    /// API 토큰
    #[serde(default)]
    pub token: Option<String>,
    /// 조직 이름
    #[serde(default)]
    pub org: Option<String>,
    /// 버킷 이름
    #[serde(default)]
    pub bucket: Option<String>,
    /// 쓰기 요청 타임아웃 (초)
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
    /// 요청 본문 인코딩
    #[serde(default)]
    pub content_encoding: ContentEncoding,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            org: None,
            bucket: None,
            timeout_secs: default_backend_timeout_secs(),
            content_encoding: ContentEncoding::default(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .field("content_encoding", &self.content_encoding)
            .finish()
    }
}

/// 검증된 백엔드 자격증명
#[derive(Clone)]
pub struct BackendCredentials {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("url", &self.url)
            .field("token", &"***")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl BackendConfig {
    /// 필수 자격증명 추출 (누락/공백이면 설정 에러)
    pub fn credentials(&self) -> Result<BackendCredentials, CoreError> {
        Ok(BackendCredentials {
            url: required(&self.url, "backend.url")?,
            token: required(&self.token, "backend.token")?,
            org: required(&self.org, "backend.org")?,
            bucket: required(&self.bucket, "backend.bucket")?,
        })
    }
}

/// pull 피드 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// 피드 서버 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 바인드 주소
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_listen_addr(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 프로세스 환경변수에서 설정 로드 및 검증
    pub fn from_env() -> Result<Self, CoreError> {
        Self::load(None)
    }

    /// 지정된 키/값 맵에서 설정 로드 및 검증
    ///
    /// 키는 환경변수 형식 (`SEICHI_STATS_BACKEND__TOKEN`).
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, CoreError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, CoreError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(vars);

        let config: AppConfig = config::Config::builder()
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::Config(format!("설정 로드 실패: {e}")))?;

        config.validate()?;
        debug!("설정 로드 완료: {config:?}");
        Ok(config)
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let upstream = required(&self.upstream.grpc_endpoint, "upstream.grpc_endpoint")?;
        parse_url(&upstream, "upstream.grpc_endpoint")?;

        let credentials = self.backend.credentials()?;
        parse_url(&credentials.url, "backend.url")?;

        let kinds = self.upstream.statistic_kinds();
        if kinds.is_empty() {
            return Err(invalid("upstream.kinds", "통계 종류가 하나 이상 필요함"));
        }
        let well_known = StatisticKind::well_known();
        if let Some(unknown) = kinds.iter().find(|k| !well_known.contains(k)) {
            return Err(invalid(
                "upstream.kinds",
                &format!("업스트림이 제공하지 않는 통계 종류: {unknown}"),
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(invalid("poll.interval_secs", "0보다 커야 함"));
        }
        if self.upstream.timeout_secs == 0 || self.upstream.timeout_secs >= self.poll.interval_secs
        {
            return Err(invalid(
                "upstream.timeout_secs",
                "0보다 크고 폴링 주기보다 작아야 함",
            ));
        }
        if self.buffer.batch_size == 0 {
            return Err(invalid("buffer.batch_size", "0보다 커야 함"));
        }
        if self.buffer.buffer_limit < self.buffer.batch_size {
            return Err(invalid(
                "buffer.buffer_limit",
                "배치 크기 이상이어야 함",
            ));
        }
        if self.buffer.flush_interval_secs == 0 {
            return Err(invalid("buffer.flush_interval_secs", "0보다 커야 함"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(invalid("backend.timeout_secs", "0보다 커야 함"));
        }
        if self.source_host.trim().is_empty() || self.source_name.trim().is_empty() {
            return Err(invalid("source_host/source_name", "비어 있으면 안 됨"));
        }
        if self.exporter.enabled && self.exporter.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "exporter.listen_addr",
                "`호스트:포트` 형식이어야 함",
            ));
        }

        Ok(())
    }

    /// 업스트림 gRPC 엔드포인트 (검증 이후 호출)
    pub fn upstream_endpoint(&self) -> Result<String, CoreError> {
        required(&self.upstream.grpc_endpoint, "upstream.grpc_endpoint")
    }

    /// 폴링 주기를 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// 폴링 지터 상한을 Duration으로 반환
    pub fn poll_jitter(&self) -> Duration {
        Duration::from_secs(self.poll.jitter_secs)
    }

    /// 플러시 주기를 Duration으로 반환
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.buffer.flush_interval_secs)
    }

    /// 플러시 지터 상한을 Duration으로 반환
    pub fn flush_jitter(&self) -> Duration {
        Duration::from_secs(self.buffer.flush_jitter_secs)
    }

    /// 업스트림 타임아웃을 Duration으로 반환
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// 피드 서버 바인드 주소 (검증 이후 호출)
    pub fn listen_addr(&self) -> Result<SocketAddr, CoreError> {
        self.exporter
            .listen_addr
            .parse()
            .map_err(|e| CoreError::Config(format!("exporter.listen_addr 오류: {e}")))
    }

    /// 백엔드 쓰기 타임아웃을 Duration으로 반환
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, CoreError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Config(format!(
            "필수 설정 누락: {field} ({ENV_PREFIX}_{} 환경변수)",
            field.to_uppercase().replace('.', "__")
        ))),
    }
}

fn parse_url(value: &str, field: &str) -> Result<url::Url, CoreError> {
    url::Url::parse(value).map_err(|e| invalid(field, &format!("잘못된 URL '{value}': {e}")))
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_source_host() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
fn default_source_name() -> String {
    "seichi-game-data".to_string()
}
fn default_upstream_timeout_secs() -> u64 {
    60
}
fn default_kinds() -> String {
    StatisticKind::well_known()
        .iter()
        .map(StatisticKind::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
fn default_poll_interval_secs() -> u64 {
    300 // 5분
}
fn default_poll_jitter_secs() -> u64 {
    20
}
fn default_batch_size() -> usize {
    10_000
}
fn default_buffer_limit() -> usize {
    200_000
}
fn default_flush_interval_secs() -> u64 {
    30
}
fn default_backend_timeout_secs() -> u64 {
    20
}
fn default_listen_addr() -> String {
    "0.0.0.0:9100".to_string()
}
