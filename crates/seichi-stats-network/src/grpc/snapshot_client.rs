//! 게임 데이터 서비스 스냅샷 클라이언트.
//!
//! 통계 종류마다 대응하는 `ReadService` RPC를 호출해 하나의 스냅샷으로 합친다.
//! 한 종류라도 실패하면 스냅샷 전체를 버린다.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tonic::transport::Endpoint;
use tracing::debug;

use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::statistic::{Player, RawSnapshot, StatisticKind, StatisticTriple};
use seichi_stats_core::ports::snapshot_source::SnapshotSource;

use super::map_grpc_status_error;
use crate::proto::seichi_game_data as proto;
use crate::proto::seichi_game_data::read_service_client::ReadServiceClient;

/// 통계 종류별 RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadRpc {
    BreakCounts,
    BuildCounts,
    PlayTicks,
    VoteCounts,
}

impl ReadRpc {
    fn for_kind(kind: &StatisticKind) -> Option<Self> {
        match kind.as_str() {
            StatisticKind::BREAK_COUNT => Some(Self::BreakCounts),
            StatisticKind::BUILD_COUNT => Some(Self::BuildCounts),
            StatisticKind::PLAY_TICKS => Some(Self::PlayTicks),
            StatisticKind::VOTE_COUNT => Some(Self::VoteCounts),
            _ => None,
        }
    }

    fn method(self) -> &'static str {
        match self {
            Self::BreakCounts => "BreakCounts",
            Self::BuildCounts => "BuildCounts",
            Self::PlayTicks => "PlayTicks",
            Self::VoteCounts => "VoteCounts",
        }
    }
}

/// gRPC 스냅샷 소스: `SnapshotSource` 포트 구현
#[derive(Debug)]
pub struct GrpcSnapshotSource {
    client: ReadServiceClient,
    endpoint: String,
    kinds: Vec<(StatisticKind, ReadRpc)>,
    timeout: Duration,
}

impl GrpcSnapshotSource {
    /// 새 소스 생성
    ///
    /// 채널은 첫 호출 때 연결한다. `timeout`은 스냅샷 한 번(모든 종류)의 전체 제한 시간이다.
    pub fn new(
        endpoint: &str,
        kinds: Vec<StatisticKind>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut rpcs = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let rpc = ReadRpc::for_kind(&kind).ok_or_else(|| {
                CoreError::Config(format!("업스트림이 제공하지 않는 통계 종류: {kind}"))
            })?;
            rpcs.push((kind, rpc));
        }

        let endpoint = endpoint.trim_end_matches('/').to_string();
        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|e| CoreError::Config(format!("업스트림 주소 오류: {e}")))?
            .connect_timeout(Duration::from_secs(10))
            .connect_lazy();

        Ok(Self {
            client: ReadServiceClient::new(channel),
            endpoint,
            kinds: rpcs,
            timeout,
        })
    }

    async fn fetch_kind(
        &self,
        kind: &StatisticKind,
        rpc: ReadRpc,
    ) -> Result<Vec<StatisticTriple>, CoreError> {
        let mut client = self.client.clone();
        let to_error = |status: tonic::Status| map_grpc_status_error(rpc.method(), status);

        let entries: Vec<(Option<proto::Player>, u64)> = match rpc {
            ReadRpc::BreakCounts => client
                .break_counts()
                .await
                .map_err(to_error)?
                .into_inner()
                .results
                .into_iter()
                .map(|e| (e.player, e.break_count))
                .collect(),
            ReadRpc::BuildCounts => client
                .build_counts()
                .await
                .map_err(to_error)?
                .into_inner()
                .results
                .into_iter()
                .map(|e| (e.player, e.build_count))
                .collect(),
            ReadRpc::PlayTicks => client
                .play_ticks()
                .await
                .map_err(to_error)?
                .into_inner()
                .results
                .into_iter()
                .map(|e| (e.player, e.play_ticks))
                .collect(),
            ReadRpc::VoteCounts => client
                .vote_counts()
                .await
                .map_err(to_error)?
                .into_inner()
                .results
                .into_iter()
                .map(|e| (e.player, e.vote_count))
                .collect(),
        };

        entries
            .into_iter()
            .map(|(player, value)| into_triple(kind, player, value))
            .collect()
    }

    async fn fetch_all(&self) -> Result<Vec<StatisticTriple>, CoreError> {
        let mut triples = Vec::new();
        for (kind, rpc) in &self.kinds {
            let batch = self.fetch_kind(kind, *rpc).await?;
            debug!("{}: {}건 수신", kind.as_str(), batch.len());
            triples.extend(batch);
        }
        Ok(triples)
    }
}

/// player 필드가 빠진 항목은 스냅샷 전체를 잘못된 것으로 본다
fn into_triple(
    kind: &StatisticKind,
    player: Option<proto::Player>,
    value: u64,
) -> Result<StatisticTriple, CoreError> {
    let player = player.ok_or_else(|| {
        CoreError::MalformedSnapshot(format!("{}: player 정보 누락", kind.as_str()))
    })?;
    Ok(StatisticTriple {
        player: Player::new(player.uuid, player.last_known_name),
        kind: kind.clone(),
        value,
    })
}

#[async_trait]
impl SnapshotSource for GrpcSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<RawSnapshot, CoreError> {
        let collected_at = Utc::now();

        let triples = tokio::time::timeout(self.timeout, self.fetch_all())
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        Ok(RawSnapshot::new(collected_at, triples))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
