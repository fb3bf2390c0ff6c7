//! 스냅샷 → 샘플 변환.

use seichi_stats_core::models::statistic::{RawSnapshot, StatisticSample};

/// 샘플 생성기
///
/// 스냅샷의 트리플마다 샘플 하나를 만든다. 모든 샘플은 스냅샷의 수집 시각을 공유한다.
#[derive(Debug, Clone)]
pub struct SampleEmitter {
    source_host: String,
    source_url: String,
}

impl SampleEmitter {
    pub fn new(source_host: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            source_host: source_host.into(),
            source_url: source_url.into(),
        }
    }

    pub fn source_host(&self) -> &str {
        &self.source_host
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// 스냅샷 하나를 샘플 묶음으로 변환
    pub fn emit(&self, snapshot: &RawSnapshot) -> Vec<StatisticSample> {
        let timestamp = snapshot.collected_at();
        snapshot
            .triples()
            .iter()
            .map(|triple| StatisticSample {
                player_id: triple.player.uuid.clone(),
                statistic_kind: triple.kind.clone(),
                value: triple.value,
                timestamp,
                source_host: self.source_host.clone(),
                source_url: self.source_url.clone(),
            })
            .collect()
    }
}
