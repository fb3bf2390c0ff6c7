//! gRPC 업스트림 어댑터
//!
//! 게임 데이터 서비스 `ReadService`를 `SnapshotSource` 포트로 감싼다.

mod error_mapping;
mod snapshot_client;

pub use error_mapping::map_grpc_status_error;
pub use snapshot_client::GrpcSnapshotSource;
