//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `seichi-stats-network`가 이 trait들을 구현하며,
//! `seichi-stats-app`에서 `Arc<dyn T>`로 와이어링한다.

pub mod compressor;
pub mod point_writer;
pub mod snapshot_source;
