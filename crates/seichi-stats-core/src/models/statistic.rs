//! 통계 스냅샷 모델.
//!
//! 업스트림 게임 데이터 서비스에서 받은 (플레이어, 통계 종류, 값) 트리플과
//! 이를 타임스탬프가 찍힌 샘플로 펼친 형태를 정의한다.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 통계 종류 (예: `play_ticks`, `break_count`)
///
/// 업스트림이 새 종류를 추가해도 코드 변경 없이 흘려보낼 수 있도록 열린 문자열로 둔다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticKind(String);

impl StatisticKind {
    /// 블록 파괴 수
    pub const BREAK_COUNT: &'static str = "break_count";
    /// 블록 설치 수
    pub const BUILD_COUNT: &'static str = "build_count";
    /// 플레이 시간 (틱)
    pub const PLAY_TICKS: &'static str = "play_ticks";
    /// 투표 수
    pub const VOTE_COUNT: &'static str = "vote_count";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 게임 데이터 서비스가 제공하는 네 가지 기본 종류
    pub fn well_known() -> Vec<StatisticKind> {
        [
            Self::BREAK_COUNT,
            Self::BUILD_COUNT,
            Self::PLAY_TICKS,
            Self::VOTE_COUNT,
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatisticKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for StatisticKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

/// 플레이어 식별 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// 플레이어 UUID (불투명 식별자)
    pub uuid: String,
    /// 마지막으로 알려진 닉네임 (진단용, 태그로 내보내지 않음)
    pub last_known_name: String,
}

impl Player {
    pub fn new(uuid: impl Into<String>, last_known_name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            last_known_name: last_known_name.into(),
        }
    }
}

/// (플레이어, 통계 종류, 값) 트리플
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticTriple {
    pub player: Player,
    pub kind: StatisticKind,
    pub value: u64,
}

/// 한 폴링 주기의 전체 스냅샷
///
/// 모든 트리플이 하나의 수집 시각을 공유한다.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    collected_at: DateTime<Utc>,
    triples: Vec<StatisticTriple>,
}

impl RawSnapshot {
    /// 새 스냅샷 생성 (수집 시각은 초 단위로 절삭)
    pub fn new(collected_at: DateTime<Utc>, triples: Vec<StatisticTriple>) -> Self {
        Self {
            collected_at: collected_at.trunc_subsecs(0),
            triples,
        }
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn triples(&self) -> &[StatisticTriple] {
        &self.triples
    }

    pub fn into_triples(self) -> Vec<StatisticTriple> {
        self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

/// 단일 관측값: 스냅샷 트리플 하나에 수집 시각과 출처를 붙인 것
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticSample {
    /// 플레이어 UUID
    pub player_id: String,
    /// 통계 종류
    pub statistic_kind: StatisticKind,
    /// 측정값
    pub value: u64,
    /// 수집 시각 (초 단위)
    pub timestamp: DateTime<Utc>,
    /// 샘플을 만든 프로세스의 호스트 식별자
    pub source_host: String,
    /// 데이터를 가져온 업스트림 엔드포인트
    pub source_url: String,
}
