//! # seichi-stats-exporter
//!
//! 샘플 생성기와 pull 피드 서버.
//! Axum 기반, 마지막 폴링 주기의 샘플을 텍스트 노출 형식으로 제공한다.
//!
//! ## 엔드포인트
//! - `GET /metrics`: 최근 주기 샘플
//! - `GET /health`: 최근 주기 시각, 샘플 수, 버퍼 통계

pub mod emitter;
pub mod error;
pub mod feed;
pub mod routes;

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use seichi_stats_network::batch_buffer::PointBuffer;

pub use emitter::SampleEmitter;
pub use feed::SampleFeed;

/// 피드 서버 상태
#[derive(Clone)]
pub struct FeedState {
    /// 최근 주기 피드
    pub feed: Arc<SampleFeed>,
    /// 버퍼 (헬스 응답용)
    pub buffer: Option<Arc<PointBuffer>>,
}

/// pull 피드 HTTP 서버
pub struct ExporterServer {
    listen_addr: SocketAddr,
    state: FeedState,
}

impl ExporterServer {
    pub fn new(feed: Arc<SampleFeed>, listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            state: FeedState { feed, buffer: None },
        }
    }

    /// 헬스 응답에 버퍼 통계 포함
    pub fn with_buffer(mut self, buffer: Arc<PointBuffer>) -> Self {
        self.state.buffer = Some(buffer);
        self
    }

    /// 라우터 구성
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::feed_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 서버 실행
    ///
    /// `shutdown_rx`가 `true`가 되면 진행 중인 요청을 마치고 종료한다.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.listen_addr).await?;
        info!("피드 서버 시작: http://{}", listener.local_addr()?);
        self.serve(listener, shutdown_rx).await
    }

    /// 이미 바인드된 리스너로 실행
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("피드 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("피드 서버 종료");
        Ok(())
    }
}
