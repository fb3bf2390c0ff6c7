//! 시계열 백엔드 쓰기 포트.
//!
//! 구현: `seichi-stats-network` crate (InfluxDB v2 write API)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::point::FlushBatch;

/// 시계열 저장소 쓰기 인터페이스
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// 배치 한 개를 백엔드에 기록
    ///
    /// `Ok`는 백엔드가 수신을 확인했다는 뜻이다.
    async fn write_batch(&self, batch: &FlushBatch) -> Result<(), CoreError>;
}
