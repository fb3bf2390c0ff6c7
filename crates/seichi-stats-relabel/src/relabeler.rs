//! 샘플 변환기.
//!
//! 단계 적용 → 이름 정책 검사 → 형태 확정. 실패한 샘플은 로그를 남기고 버린다.

use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::point::ConvertedPoint;
use seichi_stats_core::models::statistic::StatisticSample;
use tracing::{debug, warn};

use crate::draft::RelabelDraft;
use crate::guard::NameGuard;
use crate::steps;

/// 배치 변환 결과
#[derive(Debug, Default)]
pub struct ConversionOutcome {
    /// 변환에 성공한 포인트
    pub points: Vec<ConvertedPoint>,
    /// 거부된 샘플 수
    pub dropped: usize,
}

/// 샘플 → 포인트 변환기
///
/// 내부 상태가 없으므로 같은 샘플은 항상 같은 포인트가 된다.
#[derive(Debug, Clone)]
pub struct Relabeler {
    source_name: String,
    guard: NameGuard,
}

impl Relabeler {
    /// 새 변환기 생성 (`source` 태그 값 지정)
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            guard: NameGuard::default(),
        }
    }

    /// 샘플 하나 변환
    pub fn convert(&self, sample: &StatisticSample) -> Result<ConvertedPoint, CoreError> {
        let draft = steps::apply_all(RelabelDraft::from_sample(sample, &self.source_name));
        self.guard.check(&draft, &sample.player_id)?;
        draft.finish(&sample.player_id)
    }

    /// 샘플 묶음 변환: 실패한 샘플만 버리고 나머지는 계속 진행
    pub fn convert_all(&self, samples: &[StatisticSample]) -> ConversionOutcome {
        let mut outcome = ConversionOutcome {
            points: Vec::with_capacity(samples.len()),
            dropped: 0,
        };

        for sample in samples {
            match self.convert(sample) {
                Ok(point) => outcome.points.push(point),
                Err(e) => {
                    warn!(
                        "샘플 폐기: kind={}, {e}",
                        sample.statistic_kind.as_str()
                    );
                    outcome.dropped += 1;
                }
            }
        }

        debug!(
            "변환 완료: {}개 성공, {}개 폐기",
            outcome.points.len(),
            outcome.dropped
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seichi_stats_core::models::point::{
        FieldValue, FIELD_PLAYER_DATA, POINT_TAG_KEYS, TAG_HOST, TAG_SOURCE, TAG_URL, TAG_UUID,
    };
    use seichi_stats_core::models::statistic::StatisticKind;

    fn sample(player: &str, kind: &str, value: u64) -> StatisticSample {
        StatisticSample {
            player_id: player.to_string(),
            statistic_kind: StatisticKind::new(kind),
            value,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            source_host: "translator-0".to_string(),
            source_url: "http://game-data:50051".to_string(),
        }
    }

    #[test]
    fn converted_point_has_fixed_shape() {
        let relabeler = Relabeler::new("seichi-game-data");
        let point = relabeler.convert(&sample("p1", "playtime", 120)).unwrap();

        assert_eq!(point.measurement(), "playtime");
        assert!(point.tags().keys().map(String::as_str).eq(POINT_TAG_KEYS));
        assert_eq!(point.tag(TAG_UUID), Some("p1"));
        assert_eq!(point.tag(TAG_HOST), Some("translator-0"));
        assert_eq!(point.tag(TAG_URL), Some("http://game-data:50051"));
        assert_eq!(point.tag(TAG_SOURCE), Some("seichi-game-data"));
        assert_eq!(point.fields().len(), 1);
        assert_eq!(
            point.fields().get(FIELD_PLAYER_DATA),
            Some(&FieldValue::UInt(120))
        );
    }

    #[test]
    fn conversion_is_idempotent() {
        let relabeler = Relabeler::new("seichi-game-data");
        let s = sample("p1", "break_count", 9_999);

        assert_eq!(
            relabeler.convert(&s).unwrap(),
            relabeler.convert(&s).unwrap()
        );
    }

    #[test]
    fn timestamp_is_preserved() {
        let relabeler = Relabeler::new("seichi-game-data");
        let s = sample("p1", "vote_count", 3);
        assert_eq!(relabeler.convert(&s).unwrap().timestamp(), s.timestamp);
    }

    #[test]
    fn two_player_playtime_scenario() {
        let relabeler = Relabeler::new("seichi-game-data");
        let outcome =
            relabeler.convert_all(&[sample("p1", "playtime", 120), sample("p2", "playtime", 340)]);

        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.points.len(), 2);
        assert!(outcome.points.iter().all(|p| p.measurement() == "playtime"));
        assert_eq!(outcome.points[0].player_data(), 120);
        assert_eq!(outcome.points[0].tag(TAG_UUID), Some("p1"));
        assert_eq!(outcome.points[1].player_data(), 340);
        assert_eq!(outcome.points[1].tag(TAG_UUID), Some("p2"));
    }

    #[test]
    fn malformed_sample_dropped_without_aborting_batch() {
        let relabeler = Relabeler::new("seichi-game-data");
        let outcome = relabeler.convert_all(&[
            sample("p1", "play_ticks", 1),
            sample("p2", "_field", 2),
            sample("p3", "", 3),
            sample("p4", "build_count", 4),
        ]);

        assert_eq!(outcome.points.len(), 2);
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn empty_uuid_and_comment_kind_dropped_before_backend() {
        let relabeler = Relabeler::new("seichi-game-data");
        let outcome = relabeler.convert_all(&[
            sample("", "play_ticks", 1),
            sample("p2", "#comment", 2),
            sample("p3", "play_ticks", 3),
        ]);

        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.points[0].tag(TAG_UUID), Some("p3"));
    }
}
