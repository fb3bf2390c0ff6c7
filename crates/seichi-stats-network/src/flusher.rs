//! 배치 플러셔.
//!
//! 버퍼에서 배치를 꺼내 `PointWriter`로 기록한다.
//! 실패한 배치는 버퍼 앞쪽으로 되돌리고, 재시도 간격은 `RetryBackoff`가 정한다.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use seichi_stats_core::error::CoreError;
use seichi_stats_core::ports::point_writer::PointWriter;

use crate::batch_buffer::PointBuffer;

/// 플러셔 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushState {
    /// 버퍼 비어 있음
    Idle,
    /// 포인트 대기 중
    Accumulating,
    /// 기록 요청 진행 중
    Flushing,
    /// 직전 플러시 실패, 재시도 대기
    RetryWait,
}

/// 배치 플러셔
pub struct BatchFlusher {
    buffer: Arc<PointBuffer>,
    writer: Arc<dyn PointWriter>,
    write_timeout: Duration,
    flushing: Mutex<bool>,
    last_failed: Mutex<bool>,
}

impl BatchFlusher {
    pub fn new(
        buffer: Arc<PointBuffer>,
        writer: Arc<dyn PointWriter>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            buffer,
            writer,
            write_timeout,
            flushing: Mutex::new(false),
            last_failed: Mutex::new(false),
        }
    }

    pub fn buffer(&self) -> &Arc<PointBuffer> {
        &self.buffer
    }

    /// 현재 상태
    pub fn state(&self) -> FlushState {
        if *self.flushing.lock() {
            FlushState::Flushing
        } else if *self.last_failed.lock() {
            FlushState::RetryWait
        } else if self.buffer.is_empty() {
            FlushState::Idle
        } else {
            FlushState::Accumulating
        }
    }

    /// 배치 하나 기록, 기록된 포인트 수 반환
    ///
    /// 실패하면 배치를 버퍼 앞쪽에 되돌리고 에러를 반환한다.
    pub async fn flush_once(&self) -> Result<usize, CoreError> {
        let Some(batch) = self.buffer.take_batch() else {
            return Ok(0);
        };
        let count = batch.len();

        *self.flushing.lock() = true;
        let result = match tokio::time::timeout(
            self.write_timeout,
            self.writer.write_batch(&batch),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(CoreError::Timeout {
                timeout_ms: self.write_timeout.as_millis() as u64,
            }),
        };
        *self.flushing.lock() = false;

        match result {
            Ok(()) => {
                self.buffer.complete(count);
                *self.last_failed.lock() = false;
                debug!("배치 기록 성공: {count}개 포인트");
                Ok(count)
            }
            Err(e) => {
                warn!("배치 기록 실패 ({count}개 포인트 재적재): {e}");
                self.buffer.requeue_front(batch);
                *self.last_failed.lock() = true;
                Err(e)
            }
        }
    }

    /// 호출 시점에 쌓여 있던 배치를 모두 기록
    ///
    /// 첫 실패에서 멈춘다. 기록된 포인트 수 반환.
    pub async fn flush_pending(&self) -> Result<usize, CoreError> {
        let batch_size = self.buffer.batch_size();
        let batches = self.buffer.len().div_ceil(batch_size);

        let mut written = 0;
        for _ in 0..batches {
            let n = self.flush_once().await?;
            if n == 0 {
                break;
            }
            written += n;
        }
        Ok(written)
    }
}

/// 플러시 재시도 간격
///
/// 1초에서 시작해 두 배씩, 상한은 플러시 주기. 429는 서버가 준 값을 따른다.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    initial: Duration,
    current: Duration,
    cap: Duration,
}

impl RetryBackoff {
    pub fn new(cap: Duration) -> Self {
        let initial = Duration::from_secs(1).min(cap);
        Self {
            initial,
            current: initial,
            cap,
        }
    }

    /// 다음 대기 시간
    pub fn next_delay(&mut self, err: &CoreError) -> Duration {
        if let CoreError::RateLimit { retry_after_secs } = err {
            return Duration::from_secs(*retry_after_secs);
        }
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.cap);
        delay
    }

    /// 성공 후 초기화
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
