//! # seichi-stats-relabel
//!
//! 샘플 하나를 백엔드 스키마 포인트 하나로 변환한다.
//! 변환은 순서가 고정된 순수 함수 단계 목록이며, 샘플 간 상태가 없다.
//!
//! ## 구조
//!
//! - [`draft`]: 단계 사이를 흐르는 중간 표현
//! - [`steps`]: 네 개의 변환 단계
//! - [`guard`]: 측정값 이름/태그 값 방어 정책
//! - [`relabeler`]: 단계 적용 + 검증 + 배치 변환

pub mod draft;
pub mod guard;
pub mod relabeler;
pub mod steps;

pub use relabeler::{ConversionOutcome, Relabeler};
