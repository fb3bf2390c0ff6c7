//! # seichi-stats-app
//!
//! 파이프라인 와이어링과 스케줄링.
//! 바이너리(`seichi-stats`)와 통합 테스트가 함께 사용한다.

pub mod lifecycle;
pub mod pipeline;
pub mod scheduler;
