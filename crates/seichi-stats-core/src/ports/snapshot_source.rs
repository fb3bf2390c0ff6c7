//! 스냅샷 소스 포트.
//!
//! 구현: `seichi-stats-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::statistic::RawSnapshot;

/// 업스트림 통계 제공자
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// 현재 전체 (플레이어, 통계 종류, 값) 집합 조회
    ///
    /// 일부만 수신된 경우에도 에러를 반환해야 한다 (전부 아니면 전무).
    async fn fetch_snapshot(&self) -> Result<RawSnapshot, CoreError>;

    /// 데이터를 가져오는 엔드포인트 (샘플의 `url` 태그로 사용)
    fn endpoint(&self) -> &str;
}
