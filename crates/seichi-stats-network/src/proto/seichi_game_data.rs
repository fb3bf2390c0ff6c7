//! `gigantic_minecraft.seichi_game_data.v1`
//!
//! 네 RPC 모두 `google.protobuf.Empty`를 받아 종류별 플레이어 목록을 돌려준다.

/// 서비스 전체 이름 (`/{SERVICE_NAME}/{Method}` 경로에 사용)
pub const SERVICE_NAME: &str = "gigantic_minecraft.seichi_game_data.v1.ReadService";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Player {
    #[prost(string, tag = "1")]
    pub uuid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub last_known_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayerBreakCount {
    #[prost(message, optional, tag = "1")]
    pub player: ::core::option::Option<Player>,
    #[prost(uint64, tag = "2")]
    pub break_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayerBuildCount {
    #[prost(message, optional, tag = "1")]
    pub player: ::core::option::Option<Player>,
    #[prost(uint64, tag = "2")]
    pub build_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayerPlayTicks {
    #[prost(message, optional, tag = "1")]
    pub player: ::core::option::Option<Player>,
    #[prost(uint64, tag = "2")]
    pub play_ticks: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayerVoteCount {
    #[prost(message, optional, tag = "1")]
    pub player: ::core::option::Option<Player>,
    #[prost(uint64, tag = "2")]
    pub vote_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BreakCountsResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<PlayerBreakCount>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildCountsResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<PlayerBuildCount>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayTicksResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<PlayerPlayTicks>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VoteCountsResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<PlayerVoteCount>,
}

/// `ReadService` 클라이언트
pub mod read_service_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;
    use tonic::{GrpcMethod, Response, Status};
    use tonic_prost::ProstCodec;

    use super::{
        BreakCountsResponse, BuildCountsResponse, PlayTicksResponse, VoteCountsResponse,
        SERVICE_NAME,
    };

    #[derive(Debug, Clone)]
    pub struct ReadServiceClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl ReadServiceClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn break_counts(&mut self) -> Result<Response<BreakCountsResponse>, Status> {
            self.unary("BreakCounts").await
        }

        pub async fn build_counts(&mut self) -> Result<Response<BuildCountsResponse>, Status> {
            self.unary("BuildCounts").await
        }

        pub async fn play_ticks(&mut self) -> Result<Response<PlayTicksResponse>, Status> {
            self.unary("PlayTicks").await
        }

        pub async fn vote_counts(&mut self) -> Result<Response<VoteCountsResponse>, Status> {
            self.unary("VoteCounts").await
        }

        /// `Empty` 요청 단항 호출
        async fn unary<M>(&mut self, method: &'static str) -> Result<Response<M>, Status>
        where
            M: prost::Message + Default + Send + Sync + 'static,
        {
            self.inner
                .ready()
                .await
                .map_err(|e| Status::unknown(format!("서비스 준비 실패: {e}")))?;

            let path = PathAndQuery::try_from(format!("/{SERVICE_NAME}/{method}"))
                .map_err(|e| Status::internal(format!("잘못된 RPC 경로: {e}")))?;

            let mut request = tonic::Request::new(());
            request
                .extensions_mut()
                .insert(GrpcMethod::new(SERVICE_NAME, method));

            self.inner
                .unary(request, path, ProstCodec::<(), M>::default())
                .await
        }
    }
}
