//! 변환 중간 표현.
//!
//! 샘플을 피드에 노출된 형태(공통 메트릭 이름 + `kind` 태그 + `value` 필드)로 옮긴 뒤
//! 단계를 거쳐 최종 포인트 형태로 바꾼다.

use chrono::{DateTime, Utc};
use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::point::{
    ConvertedPoint, FieldValue, FEED_METRIC_NAME, TAG_HOST, TAG_KIND, TAG_SOURCE, TAG_URL,
    TAG_UUID,
};
use seichi_stats_core::models::statistic::StatisticSample;
use std::collections::BTreeMap;
use std::fmt;

/// 변환 전 원시 값 필드 키
pub const FIELD_RAW_VALUE: &str = "value";

/// 태그 값: 와이어 수준에서 타입이 모호할 수 있다
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl TagValue {
    /// 문자열 표현으로 변환
    pub fn into_string(self) -> String {
        match self {
            TagValue::Str(s) => s,
            other => other.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(s) => f.write_str(s),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::UInt(v) => write!(f, "{v}"),
            TagValue::Float(v) => write!(f, "{v}"),
            TagValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

/// 단계 사이를 흐르는 포인트 초안
#[derive(Debug, Clone, PartialEq)]
pub struct RelabelDraft {
    pub measurement: String,
    pub tags: BTreeMap<String, TagValue>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl RelabelDraft {
    /// 샘플을 피드 형태의 초안으로 옮김
    pub fn from_sample(sample: &StatisticSample, source_name: &str) -> Self {
        let tags = BTreeMap::from([
            (TAG_HOST.to_string(), TagValue::from(sample.source_host.as_str())),
            (
                TAG_KIND.to_string(),
                TagValue::from(sample.statistic_kind.as_str()),
            ),
            (TAG_SOURCE.to_string(), TagValue::from(source_name)),
            (TAG_URL.to_string(), TagValue::from(sample.source_url.as_str())),
            (TAG_UUID.to_string(), TagValue::from(sample.player_id.as_str())),
        ]);

        let fields = BTreeMap::from([(
            FIELD_RAW_VALUE.to_string(),
            FieldValue::UInt(sample.value),
        )]);

        Self {
            measurement: FEED_METRIC_NAME.to_string(),
            tags,
            fields,
            timestamp: sample.timestamp,
        }
    }

    /// 초안을 최종 포인트로 확정
    ///
    /// 문자열이 아닌 태그가 남아 있거나 키 집합이 맞지 않으면 실패한다.
    pub fn finish(self, player_id: &str) -> Result<ConvertedPoint, CoreError> {
        let mut tags = BTreeMap::new();
        for (key, value) in self.tags {
            match value {
                TagValue::Str(s) => {
                    tags.insert(key, s);
                }
                other => {
                    return Err(CoreError::Conversion {
                        player_id: player_id.to_string(),
                        reason: format!("문자열이 아닌 태그 {key}={other:?}"),
                    })
                }
            }
        }

        ConvertedPoint::new(self.measurement, tags, self.fields, self.timestamp).map_err(|e| {
            CoreError::Conversion {
                player_id: player_id.to_string(),
                reason: e.to_string(),
            }
        })
    }
}
