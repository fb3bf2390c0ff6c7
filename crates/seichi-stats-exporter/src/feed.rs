//! 최근 주기 샘플 피드.
//!
//! 마지막으로 완료된 폴링 주기의 샘플만 보관하고, 텍스트 노출 형식으로 렌더링한다.
//!
//! ```text
//! # TYPE player_data gauge
//! player_data{host="h",kind="play_ticks",source="s",url="u",uuid="p1"} 120 1714564800000
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt::Write;

use seichi_stats_core::models::point::{
    FEED_METRIC_NAME, TAG_HOST, TAG_KIND, TAG_SOURCE, TAG_URL, TAG_UUID,
};
use seichi_stats_core::models::statistic::StatisticSample;

struct FeedCycle {
    collected_at: DateTime<Utc>,
    samples: Vec<StatisticSample>,
}

/// pull 피드
pub struct SampleFeed {
    source_name: String,
    latest: RwLock<Option<FeedCycle>>,
}

impl SampleFeed {
    /// `source_name`은 `source` 라벨 값
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            latest: RwLock::new(None),
        }
    }

    /// 주기 결과 교체
    pub fn publish(&self, collected_at: DateTime<Utc>, samples: Vec<StatisticSample>) {
        *self.latest.write() = Some(FeedCycle {
            collected_at,
            samples,
        });
    }

    /// 마지막 주기 수집 시각
    pub fn last_cycle(&self) -> Option<DateTime<Utc>> {
        self.latest.read().as_ref().map(|c| c.collected_at)
    }

    pub fn sample_count(&self) -> usize {
        self.latest.read().as_ref().map_or(0, |c| c.samples.len())
    }

    /// 텍스트 노출 형식으로 렌더링
    pub fn render(&self) -> String {
        let guard = self.latest.read();
        let samples = guard.as_ref().map_or(&[][..], |c| c.samples.as_slice());

        let mut out = String::with_capacity(64 + samples.len() * 160);
        let _ = writeln!(out, "# TYPE {FEED_METRIC_NAME} gauge");

        for sample in samples {
            out.push_str(FEED_METRIC_NAME);
            out.push('{');
            let labels = [
                (TAG_HOST, sample.source_host.as_str()),
                (TAG_KIND, sample.statistic_kind.as_str()),
                (TAG_SOURCE, self.source_name.as_str()),
                (TAG_URL, sample.source_url.as_str()),
                (TAG_UUID, sample.player_id.as_str()),
            ];
            for (i, (key, value)) in labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push_str("=\"");
                escape_label(&mut out, value);
                out.push('"');
            }
            let _ = writeln!(
                out,
                "}} {} {}",
                sample.value,
                sample.timestamp.timestamp_millis()
            );
        }
        out
    }
}

fn escape_label(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}
