//! 파이프라인 컨텍스트.
//!
//! 어댑터 와이어링과 한 폴링 주기(수집 → 샘플 생성 → 피드 게시 → 변환 → 버퍼 적재) 실행.

use std::sync::Arc;
use tracing::{debug, info};

use chrono::{DateTime, Utc};
use seichi_stats_core::config::AppConfig;
use seichi_stats_core::error::CoreError;
use seichi_stats_core::ports::point_writer::PointWriter;
use seichi_stats_core::ports::snapshot_source::SnapshotSource;
use seichi_stats_exporter::{SampleEmitter, SampleFeed};
use seichi_stats_network::batch_buffer::PointBuffer;
use seichi_stats_network::flusher::BatchFlusher;
use seichi_stats_network::influx_writer::InfluxWriter;
use seichi_stats_network::grpc::GrpcSnapshotSource;
use seichi_stats_relabel::Relabeler;

/// 한 주기 실행 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub collected_at: DateTime<Utc>,
    /// 생성된 샘플 수 (= 스냅샷 트리플 수)
    pub samples: usize,
    /// 버퍼에 적재된 포인트 수
    pub converted: usize,
    /// 변환 단계에서 거부된 샘플 수
    pub rejected: usize,
    /// 버퍼 상한으로 버려진 포인트 수
    pub evicted: usize,
}

/// 파이프라인 구성 요소 묶음
pub struct PipelineContext {
    source: Arc<dyn SnapshotSource>,
    emitter: SampleEmitter,
    feed: Arc<SampleFeed>,
    relabeler: Relabeler,
    buffer: Arc<PointBuffer>,
    flusher: Arc<BatchFlusher>,
}

impl PipelineContext {
    /// 설정으로부터 gRPC 소스와 HTTP 쓰기 어댑터를 생성해 와이어링
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let source = GrpcSnapshotSource::new(
            &config.upstream_endpoint()?,
            config.upstream.statistic_kinds(),
            config.upstream_timeout(),
        )?;
        let writer = InfluxWriter::new(
            &config.backend.credentials()?,
            config.backend.content_encoding,
            config.backend_timeout(),
        )?;
        info!("백엔드 쓰기 대상: {}", writer.write_url());

        Ok(Self::new(config, Arc::new(source), Arc::new(writer)))
    }

    /// 포트 구현을 직접 지정해 와이어링
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn SnapshotSource>,
        writer: Arc<dyn PointWriter>,
    ) -> Self {
        let emitter = SampleEmitter::new(config.source_host.clone(), source.endpoint());
        let buffer = Arc::new(PointBuffer::new(
            config.buffer.batch_size,
            config.buffer.buffer_limit,
        ));
        let flusher = Arc::new(BatchFlusher::new(
            buffer.clone(),
            writer,
            config.backend_timeout(),
        ));

        Self {
            source,
            emitter,
            feed: Arc::new(SampleFeed::new(config.source_name.clone())),
            relabeler: Relabeler::new(config.source_name.clone()),
            buffer,
            flusher,
        }
    }

    pub fn feed(&self) -> &Arc<SampleFeed> {
        &self.feed
    }

    pub fn buffer(&self) -> &Arc<PointBuffer> {
        &self.buffer
    }

    pub fn flusher(&self) -> &Arc<BatchFlusher> {
        &self.flusher
    }

    /// 폴링 주기 한 번 실행
    ///
    /// 수집에 실패하면 아무것도 게시하거나 적재하지 않는다.
    pub async fn run_cycle(&self) -> Result<CycleReport, CoreError> {
        let snapshot = self.source.fetch_snapshot().await?;
        let collected_at = snapshot.collected_at();

        let samples = self.emitter.emit(&snapshot);
        debug!("샘플 {}개 생성 (트리플 {}개)", samples.len(), snapshot.len());

        let outcome = self.relabeler.convert_all(&samples);
        let sample_count = samples.len();
        self.feed.publish(collected_at, samples);

        let converted = outcome.points.len();
        let evicted = self.buffer.push_many(outcome.points);

        Ok(CycleReport {
            collected_at,
            samples: sample_count,
            converted,
            rejected: outcome.dropped,
            evicted,
        })
    }
}
