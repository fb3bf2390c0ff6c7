//! 측정값 이름/태그 값 방어 정책.
//!
//! 백엔드 예약어와 충돌하거나 비정상적인 값은 해당 샘플만 거부한다.

use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::point::FEED_METRIC_NAME;

use crate::draft::{RelabelDraft, TagValue};

/// 태그 값/측정값 이름 최대 길이 (바이트)
pub const MAX_VALUE_LEN: usize = 256;

/// 측정값 이름/태그 값 검사기
#[derive(Debug, Clone)]
pub struct NameGuard {
    max_len: usize,
    reserved: Vec<String>,
}

impl NameGuard {
    pub fn new(max_len: usize, reserved: Vec<String>) -> Self {
        Self { max_len, reserved }
    }

    /// 단계 적용이 끝난 초안 검사
    pub fn check(&self, draft: &RelabelDraft, player_id: &str) -> Result<(), CoreError> {
        let reject = |reason: String| CoreError::Conversion {
            player_id: player_id.to_string(),
            reason,
        };

        let measurement = draft.measurement.as_str();
        if measurement.is_empty() {
            return Err(reject("측정값 이름이 비어 있음".to_string()));
        }
        // `_`로 시작하는 이름은 백엔드 예약 (_measurement, _field 등)
        if measurement.starts_with('_') {
            return Err(reject(format!("예약된 측정값 이름: {measurement}")));
        }
        // line protocol은 `#`로 시작하는 줄을 주석으로 읽고 버린다
        if measurement.starts_with('#') {
            return Err(reject(format!("`#`로 시작하는 측정값 이름: {measurement}")));
        }
        if self.reserved.iter().any(|r| r == measurement) {
            return Err(reject(format!("예약된 측정값 이름: {measurement}")));
        }
        self.check_value("measurement", measurement)
            .map_err(reject)?;

        for (key, value) in &draft.tags {
            if let TagValue::Str(s) = value {
                self.check_value(key, s).map_err(reject)?;
            }
        }

        Ok(())
    }

    fn check_value(&self, key: &str, value: &str) -> Result<(), String> {
        // 빈 태그 값은 백엔드가 배치 전체를 거부한다
        if value.is_empty() {
            return Err(format!("{key} 값이 비어 있음"));
        }
        if value.len() > self.max_len {
            return Err(format!(
                "{key} 값이 너무 김 ({}바이트 > {})",
                value.len(),
                self.max_len
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(format!("{key} 값에 제어 문자 포함"));
        }
        Ok(())
    }
}

impl Default for NameGuard {
    fn default() -> Self {
        Self::new(MAX_VALUE_LEN, vec![FEED_METRIC_NAME.to_string()])
    }
}
