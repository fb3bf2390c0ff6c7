//! 포인트 배치 버퍼.
//!
//! 변환된 포인트를 모아 두었다가 `batch_size` 단위로 꺼내 준다.
//! 대기 + 전송 중 포인트 합이 `buffer_limit`를 넘으면 가장 오래된 포인트부터 버린다.
//! 실패한 배치는 앞쪽에 되돌려 다음 플러시에서 먼저 나간다.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::warn;

use seichi_stats_core::error::CoreError;
use seichi_stats_core::models::point::{ConvertedPoint, FlushBatch};

/// 버퍼 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// 대기 중인 포인트 수
    pub buffered: usize,
    /// 전송 중인 포인트 수
    pub in_flight: usize,
    /// 상한 초과로 버려진 포인트 누적
    pub dropped_total: u64,
    /// 기록 완료된 포인트 누적
    pub flushed_total: u64,
    /// 실패한 플러시 횟수
    pub failed_flushes: u64,
    pub batch_size: usize,
    pub buffer_limit: usize,
}

struct Inner {
    queue: VecDeque<ConvertedPoint>,
    in_flight: usize,
}

/// 포인트 버퍼
pub struct PointBuffer {
    inner: Mutex<Inner>,
    batch_size: usize,
    buffer_limit: usize,
    dropped_total: AtomicU64,
    flushed_total: AtomicU64,
    failed_flushes: AtomicU64,
    batch_ready: Notify,
}

impl PointBuffer {
    /// 새 버퍼 생성
    ///
    /// `buffer_limit`는 최소 `batch_size`로 올려 잡는다.
    pub fn new(batch_size: usize, buffer_limit: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                in_flight: 0,
            }),
            batch_size,
            buffer_limit: buffer_limit.max(batch_size),
            dropped_total: AtomicU64::new(0),
            flushed_total: AtomicU64::new(0),
            failed_flushes: AtomicU64::new(0),
            batch_ready: Notify::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// 포인트 추가 (순서 유지), 버려진 포인트 수 반환
    pub fn push_many(&self, points: Vec<ConvertedPoint>) -> usize {
        if points.is_empty() {
            return 0;
        }

        let (dropped, ready) = {
            let mut inner = self.inner.lock();
            inner.queue.extend(points);
            let dropped = self.enforce_limit(&mut inner);
            (dropped, inner.queue.len() >= self.batch_size)
        };

        if dropped > 0 {
            warn!("{}", CoreError::CapacityExceeded { dropped });
        }
        if ready {
            self.batch_ready.notify_one();
        }
        dropped
    }

    /// 배치 하나 꺼내기 (최대 `batch_size`개), 비어 있으면 None
    ///
    /// 꺼낸 포인트는 `complete` 또는 `requeue_front` 전까지 전송 중으로 계산된다.
    pub fn take_batch(&self) -> Option<FlushBatch> {
        let mut inner = self.inner.lock();
        if inner.queue.is_empty() {
            return None;
        }
        let n = inner.queue.len().min(self.batch_size);
        let points: Vec<ConvertedPoint> = inner.queue.drain(..n).collect();
        inner.in_flight += points.len();
        Some(FlushBatch::new(points))
    }

    /// 기록 완료 처리
    pub fn complete(&self, count: usize) {
        {
            let mut inner = self.inner.lock();
            inner.in_flight = inner.in_flight.saturating_sub(count);
        }
        self.flushed_total.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// 실패한 배치를 앞쪽에 되돌림, 버려진 포인트 수 반환
    ///
    /// 전송 중에 상한이 찼다면 되돌린 뒤 가장 오래된 것부터 버린다.
    pub fn requeue_front(&self, batch: FlushBatch) -> usize {
        self.failed_flushes.fetch_add(1, Ordering::Relaxed);
        let points = batch.into_points();

        let dropped = {
            let mut inner = self.inner.lock();
            inner.in_flight = inner.in_flight.saturating_sub(points.len());
            for point in points.into_iter().rev() {
                inner.queue.push_front(point);
            }
            self.enforce_limit(&mut inner)
        };

        if dropped > 0 {
            warn!("재적재 중 {}", CoreError::CapacityExceeded { dropped });
        }
        dropped
    }

    /// 대기 중인 포인트 수
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 전송 중인 포인트 수
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    /// 배치 하나 이상이 쌓일 때까지 대기
    pub async fn wait_batch_ready(&self) {
        loop {
            let notified = self.batch_ready.notified();
            if self.len() >= self.batch_size {
                return;
            }
            notified.await;
        }
    }

    pub fn stats(&self) -> BufferStats {
        let (buffered, in_flight) = {
            let inner = self.inner.lock();
            (inner.queue.len(), inner.in_flight)
        };
        BufferStats {
            buffered,
            in_flight,
            dropped_total: self.dropped_total.load(Ordering::Relaxed),
            flushed_total: self.flushed_total.load(Ordering::Relaxed),
            failed_flushes: self.failed_flushes.load(Ordering::Relaxed),
            batch_size: self.batch_size,
            buffer_limit: self.buffer_limit,
        }
    }

    fn enforce_limit(&self, inner: &mut Inner) -> usize {
        let total = inner.queue.len() + inner.in_flight;
        if total <= self.buffer_limit {
            return 0;
        }
        let dropped = (total - self.buffer_limit).min(inner.queue.len());
        inner.queue.drain(..dropped);
        self.dropped_total
            .fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seichi_stats_core::models::point::{FieldValue, FIELD_PLAYER_DATA, TAG_UUID};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn point(n: u64) -> ConvertedPoint {
        let tags = BTreeMap::from([
            ("host".to_string(), "h".to_string()),
            ("source".to_string(), "s".to_string()),
            ("url".to_string(), "u".to_string()),
            ("uuid".to_string(), format!("p{n}")),
        ]);
        ConvertedPoint::new(
            "play_ticks".to_string(),
            tags,
            BTreeMap::from([(FIELD_PLAYER_DATA.to_string(), FieldValue::UInt(n))]),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn points(range: std::ops::Range<u64>) -> Vec<ConvertedPoint> {
        range.map(point).collect()
    }

    #[test]
    fn take_batch_respects_batch_size_and_order() {
        let buffer = PointBuffer::new(3, 100);
        buffer.push_many(points(0..5));

        let first = buffer.take_batch().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.points()[0].player_data(), 0);
        assert_eq!(buffer.in_flight(), 3);

        let second = buffer.take_batch().unwrap();
        assert_eq!(second.len(), 2);
        assert!(buffer.take_batch().is_none());
    }

    #[test]
    fn ceiling_drops_oldest() {
        let buffer = PointBuffer::new(10, 100);
        let dropped = buffer.push_many(points(0..150));

        assert_eq!(dropped, 50);
        assert_eq!(buffer.len(), 100);
        let batch = buffer.take_batch().unwrap();
        assert_eq!(batch.points()[0].player_data(), 50);
        assert_eq!(buffer.stats().dropped_total, 50);
    }

    #[test]
    fn requeued_batch_goes_first() {
        let buffer = PointBuffer::new(2, 100);
        buffer.push_many(points(0..4));

        let batch = buffer.take_batch().unwrap();
        buffer.push_many(points(4..5));
        buffer.requeue_front(batch);

        assert_eq!(buffer.in_flight(), 0);
        assert_eq!(buffer.len(), 5);
        let again = buffer.take_batch().unwrap();
        assert_eq!(again.points()[0].tag(TAG_UUID), Some("p0"));
        assert_eq!(again.points()[1].tag(TAG_UUID), Some("p1"));
        assert_eq!(buffer.stats().failed_flushes, 1);
    }

    #[test]
    fn in_flight_counts_toward_ceiling() {
        let buffer = PointBuffer::new(10, 20);
        buffer.push_many(points(0..10));
        let _batch = buffer.take_batch().unwrap();

        let dropped = buffer.push_many(points(10..25));
        assert_eq!(dropped, 5);
        assert_eq!(buffer.len() + buffer.in_flight(), 20);
    }

    #[test]
    fn complete_updates_stats() {
        let buffer = PointBuffer::new(5, 50);
        buffer.push_many(points(0..5));
        let batch = buffer.take_batch().unwrap();
        buffer.complete(batch.len());

        let stats = buffer.stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.flushed_total, 5);
        assert_eq!(stats.buffered, 0);
    }

    #[test]
    fn limit_never_below_batch_size() {
        let buffer = PointBuffer::new(10, 3);
        assert_eq!(buffer.buffer_limit(), 10);
    }

    #[tokio::test]
    async fn batch_ready_wakes_waiter() {
        let buffer = Arc::new(PointBuffer::new(3, 100));
        let waiter = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.wait_batch_ready().await })
        };

        buffer.push_many(points(0..1));
        buffer.push_many(points(1..3));

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("배치 준비 알림 없음")
            .unwrap();
    }
}
