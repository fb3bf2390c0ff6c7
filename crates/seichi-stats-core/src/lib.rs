//! # seichi-stats-core
//!
//! 세이치 통계 파이프라인의 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 스냅샷/샘플/포인트 데이터 구조체
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 환경변수 기반 애플리케이션 설정

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
