//! 변환된 시계열 포인트와 플러시 배치.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::CoreError;

/// 데이터 출처 이름 태그
pub const TAG_SOURCE: &str = "source";
/// 플레이어 UUID 태그
pub const TAG_UUID: &str = "uuid";
/// 샘플 생성 호스트 태그
pub const TAG_HOST: &str = "host";
/// 업스트림 엔드포인트 태그
pub const TAG_URL: &str = "url";
/// 유일한 필드 키
pub const FIELD_PLAYER_DATA: &str = "player_data";

/// pull 피드의 통계 종류 태그 (변환 전)
pub const TAG_KIND: &str = "kind";
/// pull 피드의 공통 메트릭 이름 (변환 전 측정값 이름)
pub const FEED_METRIC_NAME: &str = "player_data";

/// 변환 후 남는 태그 키 전체 (정렬 순서)
pub const POINT_TAG_KEYS: [&str; 4] = [TAG_HOST, TAG_SOURCE, TAG_URL, TAG_UUID];

/// 필드 값
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 부호 없는 정수 (백엔드 `u` 접미사)
    UInt(u64),
    /// 부호 있는 정수
    Int(i64),
    /// 실수
    Float(f64),
}

/// 백엔드 스키마로 변환된 포인트
///
/// 태그/필드 키 집합은 고정되어 있으며 생성자에서 검증한다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedPoint {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl ConvertedPoint {
    /// 불변식을 검증하며 포인트 생성
    ///
    /// - 측정값 이름이 비어 있지 않음
    /// - 태그 키가 정확히 `{host, source, url, uuid}`
    /// - 필드가 정확히 `{player_data}`이고 UInt 타입
    pub fn new(
        measurement: String,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        if measurement.is_empty() {
            return Err(CoreError::Validation {
                field: "measurement".to_string(),
                message: "측정값 이름이 비어 있음".to_string(),
            });
        }

        if !tags.keys().map(String::as_str).eq(POINT_TAG_KEYS) {
            return Err(CoreError::Validation {
                field: "tags".to_string(),
                message: format!("태그 키 불일치: {:?}", tags.keys().collect::<Vec<_>>()),
            });
        }

        match (fields.len(), fields.get(FIELD_PLAYER_DATA)) {
            (1, Some(FieldValue::UInt(_))) => {}
            _ => {
                return Err(CoreError::Validation {
                    field: "fields".to_string(),
                    message: format!("필드는 {FIELD_PLAYER_DATA}(uint) 하나여야 함: {fields:?}"),
                })
            }
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// `player_data` 필드 값 (생성자에서 UInt 보장)
    pub fn player_data(&self) -> u64 {
        match self.fields.get(FIELD_PLAYER_DATA) {
            Some(FieldValue::UInt(v)) => *v,
            _ => 0,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 백엔드로 한 번에 전송되는 포인트 묶음
#[derive(Debug, Clone)]
pub struct FlushBatch {
    points: Vec<ConvertedPoint>,
    created_at: DateTime<Utc>,
}

impl FlushBatch {
    pub fn new(points: Vec<ConvertedPoint>) -> Self {
        Self {
            points,
            created_at: Utc::now(),
        }
    }

    pub fn points(&self) -> &[ConvertedPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<ConvertedPoint> {
        self.points
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
