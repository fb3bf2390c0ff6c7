//! 스케줄러.
//!
//! 두 개의 독립 루프:
//! - 폴링 루프: 주기 + 지터마다 파이프라인 주기 한 번 (한 번에 하나만)
//! - 플러시 루프: 주기 + 지터 또는 배치 준비 시 버퍼 배출, 실패 시 백오프 대기
//!
//! 종료 신호를 받으면 두 루프가 모두 끝난 뒤(진행 중인 주기의 적재 포함)
//! 마지막으로 한 번 버퍼를 비운다.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Level};

use seichi_stats_core::config::AppConfig;
use seichi_stats_core::error::CoreError;
use seichi_stats_network::flusher::RetryBackoff;

use crate::pipeline::PipelineContext;

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub poll_jitter: Duration,
    pub flush_interval: Duration,
    pub flush_jitter: Duration,
    /// 종료 시 마지막 배출 제한 시간
    pub drain_timeout: Duration,
}

impl From<&AppConfig> for SchedulerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            poll_jitter: config.poll_jitter(),
            flush_interval: config.flush_interval(),
            flush_jitter: config.flush_jitter(),
            drain_timeout: config.backend_timeout(),
        }
    }
}

/// 파이프라인 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    ctx: Arc<PipelineContext>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, ctx: Arc<PipelineContext>) -> Self {
        Self { config, ctx }
    }

    /// 종료 신호까지 폴링/플러시 루프 실행
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        info!(
            "스케줄러 시작: 폴링 {}s(+{}s), 플러시 {}s(+{}s)",
            self.config.poll_interval.as_secs(),
            self.config.poll_jitter.as_secs(),
            self.config.flush_interval.as_secs(),
            self.config.flush_jitter.as_secs(),
        );

        futures::future::join(
            self.poll_loop(shutdown_rx.clone()),
            self.flush_loop(shutdown_rx),
        )
        .await;

        // 폴링 루프가 끝난 뒤에는 더 이상 적재되지 않는다
        let lost = self.final_drain().await;
        info!("스케줄러 종료 (유실 {lost}개)");
    }

    /// 주기 한 번 실행 후 버퍼를 모두 배출 (`--once`)
    pub async fn run_once(&self) -> Result<usize, CoreError> {
        let report = self.ctx.run_cycle().await?;
        info!(
            "주기 완료: 샘플 {}개, 적재 {}개, 거부 {}개",
            report.samples, report.converted, report.rejected
        );

        let mut written = 0;
        while !self.ctx.buffer().is_empty() {
            written += self.ctx.flusher().flush_pending().await?;
        }
        Ok(written)
    }

    async fn poll_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            match self.ctx.run_cycle().await {
                Ok(report) => {
                    info!(
                        "주기 완료: 샘플 {}개, 적재 {}개, 거부 {}개, 버퍼 {}개",
                        report.samples,
                        report.converted,
                        report.rejected,
                        self.ctx.buffer().len()
                    );
                    if report.evicted > 0 {
                        warn!(
                            "버퍼 상한으로 {}개 폐기 (누적 {}개)",
                            report.evicted,
                            self.ctx.buffer().stats().dropped_total
                        );
                    }
                }
                Err(e) => error!("주기 실패, 다음 주기에 재시도: {e}"),
            }

            let delay = self
                .config
                .poll_interval
                .saturating_add(jitter(self.config.poll_jitter));
            debug!("다음 폴링까지 {}ms", delay.as_millis());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => break,
            }
        }
        debug!("폴링 루프 종료");
    }

    async fn flush_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let flusher = self.ctx.flusher();
        let buffer = self.ctx.buffer();
        let mut backoff = RetryBackoff::new(self.config.flush_interval);
        let mut retry_delay: Option<Duration> = None;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let wait = retry_delay.unwrap_or_else(|| {
                self.config
                    .flush_interval
                    .saturating_add(jitter(self.config.flush_jitter))
            });
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = buffer.wait_batch_ready(), if retry_delay.is_none() => {}
                _ = shutdown_rx.changed() => break,
            }

            match flusher.flush_pending().await {
                Ok(written) => {
                    backoff.reset();
                    retry_delay = None;
                    if written > 0 {
                        debug!("플러시 완료: {written}개 포인트");
                    }
                }
                Err(e) => {
                    let delay = backoff.next_delay(&e);
                    if flush_failure_level(&e) == Level::WARN {
                        warn!("플러시 실패, {}ms 후 재시도: {e}", delay.as_millis());
                    } else {
                        error!("플러시 실패, {}ms 후 재시도: {e}", delay.as_millis());
                    }
                    retry_delay = Some(delay);
                }
            }
        }

        debug!("플러시 루프 종료");
    }

    /// 종료 전 마지막 배출, 기록하지 못한 포인트 수를 반환
    async fn final_drain(&self) -> usize {
        let buffer = self.ctx.buffer();
        if buffer.is_empty() {
            return 0;
        }
        info!("종료 전 버퍼 배출: {}개", buffer.len());
        let result = tokio::time::timeout(
            self.config.drain_timeout,
            self.ctx.flusher().flush_pending(),
        )
        .await;

        let lost = buffer.len() + buffer.in_flight();
        match result {
            Ok(Ok(written)) => info!("종료 전 배출 완료: {written}개"),
            Ok(Err(e)) => warn!("종료 전 배출 실패, {lost}개 유실: {e}"),
            Err(_) => warn!("종료 전 배출 시간 초과, {lost}개 유실"),
        }
        lost
    }
}

/// 플러시 실패 로그 레벨: 일시적 실패는 WARN, 설정/인증 등 운영자 조치가 필요한 실패는 ERROR
fn flush_failure_level(err: &CoreError) -> Level {
    if err.is_transient() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

/// `0..=max` 구간의 임의 지연
fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::random::<u64>() % max_ms.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use seichi_stats_core::models::point::FlushBatch;
    use seichi_stats_core::models::statistic::{
        Player, RawSnapshot, StatisticKind, StatisticTriple,
    };
    use seichi_stats_core::ports::point_writer::PointWriter;
    use seichi_stats_core::ports::snapshot_source::SnapshotSource;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// 주기마다 새 플레이어 `per_cycle`명을 돌려주는 소스
    struct CountingSource {
        per_cycle: usize,
        cycles: AtomicUsize,
    }

    impl CountingSource {
        fn new(per_cycle: usize) -> Self {
            Self {
                per_cycle,
                cycles: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn fetch_snapshot(&self) -> Result<RawSnapshot, CoreError> {
            let cycle = self.cycles.fetch_add(1, Ordering::SeqCst);
            let triples = (0..self.per_cycle)
                .map(|i| StatisticTriple {
                    player: Player::new(format!("c{cycle}-p{i}"), ""),
                    kind: StatisticKind::new("play_ticks"),
                    value: i as u64,
                })
                .collect();
            Ok(RawSnapshot::new(Utc::now(), triples))
        }

        fn endpoint(&self) -> &str {
            "http://game-data:50051"
        }
    }

    /// 앞의 `fail_until`번은 실패, 호출 시각과 기록된 포인트 수를 남긴다
    struct FlakeyWriter {
        fail_until: usize,
        failure: fn() -> CoreError,
        calls: Mutex<Vec<Instant>>,
        written: AtomicUsize,
    }

    impl FlakeyWriter {
        fn new(fail_until: usize) -> Self {
            Self {
                fail_until,
                failure: || CoreError::Write("backend overloaded".to_string()),
                calls: Mutex::new(Vec::new()),
                written: AtomicUsize::new(0),
            }
        }

        fn call_offsets(&self, start: Instant) -> Vec<Duration> {
            self.calls.lock().iter().map(|t| *t - start).collect()
        }
    }

    #[async_trait]
    impl PointWriter for FlakeyWriter {
        async fn write_batch(&self, batch: &FlushBatch) -> Result<(), CoreError> {
            let attempt = {
                let mut calls = self.calls.lock();
                calls.push(Instant::now());
                calls.len()
            };
            if attempt <= self.fail_until {
                return Err((self.failure)());
            }
            self.written.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    fn app_config(batch_size: usize) -> AppConfig {
        AppConfig::from_map(HashMap::from([
            (
                "SEICHI_STATS_UPSTREAM__GRPC_ENDPOINT".to_string(),
                "http://game-data:50051".to_string(),
            ),
            ("SEICHI_STATS_BACKEND__URL".to_string(), "http://influx:8086".to_string()),
            ("SEICHI_STATS_BACKEND__TOKEN".to_string(), "t".to_string()),
            ("SEICHI_STATS_BACKEND__ORG".to_string(), "o".to_string()),
            ("SEICHI_STATS_BACKEND__BUCKET".to_string(), "b".to_string()),
            (
                "SEICHI_STATS_BUFFER__BATCH_SIZE".to_string(),
                batch_size.to_string(),
            ),
            ("SEICHI_STATS_BUFFER__BUFFER_LIMIT".to_string(), "1000".to_string()),
        ]))
        .unwrap()
    }

    fn scheduler_config(poll_interval: Duration) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval,
            poll_jitter: Duration::ZERO,
            flush_interval: Duration::from_secs(30),
            flush_jitter: Duration::ZERO,
            drain_timeout: Duration::from_secs(5),
        }
    }

    /// `run_for` 동안 스케줄러를 돌린 뒤 종료 신호를 보내고 끝날 때까지 대기
    async fn run_scheduler(
        poll_interval: Duration,
        batch_size: usize,
        per_cycle: usize,
        writer: Arc<FlakeyWriter>,
        run_for: Duration,
    ) -> Arc<PipelineContext> {
        let ctx = Arc::new(PipelineContext::new(
            &app_config(batch_size),
            Arc::new(CountingSource::new(per_cycle)),
            writer,
        ));
        let scheduler = Arc::new(Scheduler::new(scheduler_config(poll_interval), ctx.clone()));
        let (tx, rx) = watch::channel(false);

        let handle = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run(rx).await })
        };
        tokio::time::sleep(run_for).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
        ctx
    }

    fn within(actual: Duration, expected: Duration) -> bool {
        actual >= expected && actual < expected + Duration::from_millis(100)
    }

    #[test]
    fn jitter_within_bound() {
        let max = Duration::from_secs(20);
        for _ in 0..1_000 {
            assert!(jitter(max) <= max);
        }
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
        assert!(jitter(Duration::MAX) <= Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn full_batch_flushes_before_timer() {
        let writer = Arc::new(FlakeyWriter::new(0));
        let start = Instant::now();
        run_scheduler(
            Duration::from_secs(300),
            3,
            3,
            writer.clone(),
            Duration::from_secs(5),
        )
        .await;

        let offsets = writer.call_offsets(start);
        assert_eq!(offsets.len(), 1);
        assert!(within(offsets[0], Duration::ZERO), "{offsets:?}");
        assert_eq!(writer.written.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_batch_waits_for_flush_interval() {
        let writer = Arc::new(FlakeyWriter::new(0));
        let start = Instant::now();
        run_scheduler(
            Duration::from_secs(300),
            10,
            1,
            writer.clone(),
            Duration::from_secs(40),
        )
        .await;

        let offsets = writer.call_offsets(start);
        assert_eq!(offsets.len(), 1);
        assert!(within(offsets[0], Duration::from_secs(30)), "{offsets:?}");
        assert_eq!(writer.written.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_backs_off_then_resets() {
        // 실패 후 남은 배치가 이미 준비 상태여도 재시도 대기 중에는 깨어나지 않는다
        let writer = Arc::new(FlakeyWriter::new(2));
        let start = Instant::now();
        let ctx = run_scheduler(
            Duration::from_secs(10),
            1,
            1,
            writer.clone(),
            Duration::from_secs(12),
        )
        .await;

        let offsets = writer.call_offsets(start);
        assert_eq!(offsets.len(), 4, "{offsets:?}");
        assert!(within(offsets[0], Duration::ZERO), "{offsets:?}");
        assert!(within(offsets[1] - offsets[0], Duration::from_secs(1)), "{offsets:?}");
        assert!(within(offsets[2] - offsets[1], Duration::from_secs(2)), "{offsets:?}");
        // 성공 후 백오프가 풀려 다음 주기의 배치 준비 신호로 즉시 플러시
        assert!(within(offsets[3], Duration::from_secs(10)), "{offsets:?}");

        assert_eq!(writer.written.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.buffer().stats().failed_flushes, 2);
        assert!(ctx.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_flush_waits_server_delay() {
        let writer = Arc::new(FlakeyWriter {
            failure: || CoreError::RateLimit {
                retry_after_secs: 7,
            },
            ..FlakeyWriter::new(1)
        });
        let start = Instant::now();
        run_scheduler(
            Duration::from_secs(300),
            1,
            1,
            writer.clone(),
            Duration::from_secs(9),
        )
        .await;

        let offsets = writer.call_offsets(start);
        assert_eq!(offsets.len(), 2, "{offsets:?}");
        assert!(within(offsets[1] - offsets[0], Duration::from_secs(7)), "{offsets:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn final_drain_reports_unwritten_points() {
        let writer = Arc::new(FlakeyWriter {
            failure: || CoreError::Auth("token revoked".to_string()),
            ..FlakeyWriter::new(usize::MAX)
        });
        let ctx = Arc::new(PipelineContext::new(
            &app_config(10),
            Arc::new(CountingSource::new(4)),
            writer,
        ));
        ctx.run_cycle().await.unwrap();

        let scheduler = Scheduler::new(scheduler_config(Duration::from_secs(300)), ctx.clone());
        assert_eq!(scheduler.final_drain().await, 4);
        assert_eq!(ctx.buffer().len(), 4);
    }

    #[test]
    fn transient_failures_log_at_warn() {
        assert_eq!(
            flush_failure_level(&CoreError::Write("quota".to_string())),
            Level::WARN
        );
        assert_eq!(
            flush_failure_level(&CoreError::Timeout { timeout_ms: 20_000 }),
            Level::WARN
        );
        assert_eq!(
            flush_failure_level(&CoreError::RateLimit {
                retry_after_secs: 60
            }),
            Level::WARN
        );
    }

    #[test]
    fn permanent_failures_log_at_error() {
        assert_eq!(
            flush_failure_level(&CoreError::Auth("bad token".to_string())),
            Level::ERROR
        );
        assert_eq!(
            flush_failure_level(&CoreError::Config("bucket".to_string())),
            Level::ERROR
        );
    }
}
