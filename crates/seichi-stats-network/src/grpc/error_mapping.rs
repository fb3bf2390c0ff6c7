use seichi_stats_core::error::CoreError;
use tonic::{Code, Status};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// gRPC 상태를 수집 단계 에러로 변환
///
/// 인증 계열만 비일시적이며 나머지는 다음 주기에 다시 시도한다.
pub fn map_grpc_status_error(operation: &str, status: Status) -> CoreError {
    let code = status.code();
    let message = status.message().to_string();

    match code {
        Code::Unauthenticated | Code::PermissionDenied => {
            CoreError::Auth(format!("{operation}: {message}"))
        }
        Code::ResourceExhausted => CoreError::RateLimit {
            retry_after_secs: extract_retry_after_secs(&status),
        },
        Code::Unavailable => CoreError::ServiceUnavailable(format!("{operation}: {message}")),
        Code::DataLoss => CoreError::MalformedSnapshot(format!("{operation}: {message}")),
        _ => CoreError::Fetch(format!("{operation}: {message} ({code})")),
    }
}

fn extract_retry_after_secs(status: &Status) -> u64 {
    status
        .metadata()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use tonic::Status;

    use super::*;

    #[test]
    fn maps_unauthenticated_to_auth_error() {
        let err = map_grpc_status_error("BreakCounts", Status::unauthenticated("bad token"));
        assert!(matches!(err, CoreError::Auth(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn maps_resource_exhausted_to_rate_limit_with_default_retry() {
        let err = map_grpc_status_error("PlayTicks", Status::resource_exhausted("busy"));
        assert!(matches!(
            err,
            CoreError::RateLimit {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS
            }
        ));
    }

    #[test]
    fn reads_retry_after_metadata() {
        let mut status = Status::resource_exhausted("busy");
        status
            .metadata_mut()
            .insert("retry-after", "7".parse().unwrap());
        let err = map_grpc_status_error("PlayTicks", status);
        assert!(matches!(err, CoreError::RateLimit { retry_after_secs: 7 }));
    }

    #[test]
    fn maps_unavailable_to_service_unavailable() {
        let err = map_grpc_status_error("VoteCounts", Status::unavailable("down"));
        assert!(matches!(err, CoreError::ServiceUnavailable(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn other_codes_are_transient_fetch_errors() {
        let err = map_grpc_status_error("BuildCounts", Status::internal("db error"));
        assert!(matches!(err, CoreError::Fetch(_)));
        assert!(err.is_transient());
    }
}
