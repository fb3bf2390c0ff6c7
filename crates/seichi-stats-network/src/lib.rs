//! # seichi-stats-network
//!
//! 네트워크 어댑터.
//! 업스트림 게임 데이터 서비스(gRPC)에서 스냅샷을 가져오고,
//! 변환된 포인트를 버퍼링해 시계열 백엔드(InfluxDB v2)에 배치로 기록한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use seichi_stats_network::batch_buffer::PointBuffer;
//! use seichi_stats_network::flusher::BatchFlusher;
//! use seichi_stats_network::influx_writer::InfluxWriter;
//! use seichi_stats_network::grpc::GrpcSnapshotSource;
//! ```

pub mod batch_buffer;
pub mod compression;
pub mod flusher;
pub mod grpc;
pub mod http_error;
pub mod influx_writer;
pub mod line_protocol;
pub mod proto;
