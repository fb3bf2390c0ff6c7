//! 변환 단계.
//!
//! 각 단계는 초안을 받아 초안을 돌려주는 전함수이며 실패하지 않는다.
//! 형태 검증은 모든 단계가 끝난 뒤 [`RelabelDraft::finish`]에서 한 번에 한다.

use seichi_stats_core::models::point::{
    FieldValue, FIELD_PLAYER_DATA, TAG_HOST, TAG_KIND, TAG_URL, TAG_UUID,
};

use crate::draft::{RelabelDraft, TagValue, FIELD_RAW_VALUE};

/// 이름 변경 후의 통계 종류 태그 키
pub const TAG_STATS_KIND: &str = "statsKind";

/// 문자열로 강제할 태그 키
pub const STRING_TAGS: [&str; 3] = [TAG_HOST, TAG_URL, TAG_UUID];

/// 변환 단계 함수
pub type RelabelStep = fn(RelabelDraft) -> RelabelDraft;

/// 적용 순서대로 나열한 단계 목록
pub const STEPS: [(&str, RelabelStep); 4] = [
    ("rename_kind_tag", rename_kind_tag),
    ("promote_stats_kind", promote_stats_kind),
    ("coerce_string_tags", coerce_string_tags),
    ("coerce_player_data", coerce_player_data),
];

/// 1. `kind` 태그 키를 `statsKind`로 변경 (값은 그대로)
pub fn rename_kind_tag(mut draft: RelabelDraft) -> RelabelDraft {
    if let Some(kind) = draft.tags.remove(TAG_KIND) {
        draft.tags.insert(TAG_STATS_KIND.to_string(), kind);
    }
    draft
}

/// 2. `statsKind` 태그 값을 측정값 이름으로 승격하고 태그에서 제거
pub fn promote_stats_kind(mut draft: RelabelDraft) -> RelabelDraft {
    if let Some(kind) = draft.tags.remove(TAG_STATS_KIND) {
        draft.measurement = kind.into_string();
    }
    draft
}

/// 3. `host`, `url`, `uuid` 태그를 명시적으로 문자열 타입으로 강제
pub fn coerce_string_tags(mut draft: RelabelDraft) -> RelabelDraft {
    for key in STRING_TAGS {
        if let Some(value) = draft.tags.remove(key) {
            draft
                .tags
                .insert(key.to_string(), TagValue::Str(value.into_string()));
        }
    }
    draft
}

/// 4. 숫자 값을 부호 없는 정수 필드 `player_data`로 강제
///
/// 음수는 0, 실수는 소수점 이하를 버린다.
pub fn coerce_player_data(mut draft: RelabelDraft) -> RelabelDraft {
    let raw = draft
        .fields
        .remove(FIELD_RAW_VALUE)
        .or_else(|| draft.fields.remove(FIELD_PLAYER_DATA));
    draft.fields.clear();

    if let Some(raw) = raw {
        let value = match raw {
            FieldValue::UInt(v) => v,
            FieldValue::Int(v) => u64::try_from(v).unwrap_or(0),
            FieldValue::Float(v) if v.is_finite() && v > 0.0 => v as u64,
            FieldValue::Float(_) => 0,
        };
        draft
            .fields
            .insert(FIELD_PLAYER_DATA.to_string(), FieldValue::UInt(value));
    }
    draft
}

/// 모든 단계를 순서대로 적용
pub fn apply_all(draft: RelabelDraft) -> RelabelDraft {
    STEPS.iter().fold(draft, |draft, (_, step)| step(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use seichi_stats_core::models::point::{FEED_METRIC_NAME, TAG_SOURCE};
    use std::collections::BTreeMap;

    fn feed_draft() -> RelabelDraft {
        RelabelDraft {
            measurement: FEED_METRIC_NAME.to_string(),
            tags: BTreeMap::from([
                (TAG_HOST.to_string(), TagValue::from("translator-0")),
                (TAG_KIND.to_string(), TagValue::from("play_ticks")),
                (TAG_SOURCE.to_string(), TagValue::from("seichi-game-data")),
                (TAG_URL.to_string(), TagValue::from("http://game-data:50051")),
                (TAG_UUID.to_string(), TagValue::from("p1")),
            ]),
            fields: BTreeMap::from([(FIELD_RAW_VALUE.to_string(), FieldValue::UInt(120))]),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn rename_keeps_value() {
        let draft = rename_kind_tag(feed_draft());
        assert!(!draft.tags.contains_key(TAG_KIND));
        assert_eq!(
            draft.tags.get(TAG_STATS_KIND),
            Some(&TagValue::from("play_ticks"))
        );
    }

    #[test]
    fn promote_moves_kind_into_measurement() {
        let draft = promote_stats_kind(rename_kind_tag(feed_draft()));
        assert_eq!(draft.measurement, "play_ticks");
        assert!(!draft.tags.contains_key(TAG_STATS_KIND));
    }

    #[test]
    fn promote_without_kind_leaves_measurement() {
        let draft = promote_stats_kind(feed_draft());
        assert_eq!(draft.measurement, FEED_METRIC_NAME);
    }

    #[test]
    fn numeric_tags_become_strings() {
        let mut draft = feed_draft();
        draft.tags.insert(TAG_UUID.to_string(), TagValue::UInt(12345));
        draft.tags.insert(TAG_HOST.to_string(), TagValue::Bool(true));

        let draft = coerce_string_tags(draft);
        assert_eq!(draft.tags.get(TAG_UUID), Some(&TagValue::from("12345")));
        assert_eq!(draft.tags.get(TAG_HOST), Some(&TagValue::from("true")));
    }

    #[test]
    fn value_becomes_uint_player_data() {
        let draft = coerce_player_data(feed_draft());
        assert_eq!(
            draft.fields,
            BTreeMap::from([(FIELD_PLAYER_DATA.to_string(), FieldValue::UInt(120))])
        );
    }

    #[test]
    fn float_and_negative_values_are_clamped() {
        let mut draft = feed_draft();
        draft
            .fields
            .insert(FIELD_RAW_VALUE.to_string(), FieldValue::Float(340.9));
        assert_eq!(
            coerce_player_data(draft).fields.get(FIELD_PLAYER_DATA),
            Some(&FieldValue::UInt(340))
        );

        let mut draft = feed_draft();
        draft
            .fields
            .insert(FIELD_RAW_VALUE.to_string(), FieldValue::Int(-5));
        assert_eq!(
            coerce_player_data(draft).fields.get(FIELD_PLAYER_DATA),
            Some(&FieldValue::UInt(0))
        );
    }

    #[test]
    fn extraneous_fields_are_dropped() {
        let mut draft = feed_draft();
        draft
            .fields
            .insert("last_known_name".to_string(), FieldValue::Int(1));

        let draft = coerce_player_data(draft);
        assert_eq!(draft.fields.len(), 1);
        assert!(draft.fields.contains_key(FIELD_PLAYER_DATA));
    }

    #[test]
    fn steps_run_in_declared_order() {
        let names: Vec<&str> = STEPS.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "rename_kind_tag",
                "promote_stats_kind",
                "coerce_string_tags",
                "coerce_player_data"
            ]
        );

        let draft = apply_all(feed_draft());
        assert_eq!(draft.measurement, "play_ticks");
        assert_eq!(draft.tags.len(), 4);
    }
}
