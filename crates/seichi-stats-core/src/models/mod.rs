//! 파이프라인 도메인 모델.
//!
//! 스냅샷 → 샘플 → 변환 포인트 → 플러시 배치 순으로 흐르는 데이터 구조체.

pub mod point;
pub mod statistic;
