//! Proto 메시지 및 gRPC 클라이언트 정의
//!
//! 업스트림 게임 데이터 서비스(`gigantic_minecraft.seichi_game_data.v1`)의
//! 메시지와 `ReadService` 클라이언트. 빌드 스크립트 없이 prost derive로 직접 선언한다.

/// 게임 데이터 읽기 서비스 (BreakCounts, BuildCounts, PlayTicks, VoteCounts)
pub mod seichi_game_data;
