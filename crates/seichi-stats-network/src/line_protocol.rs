//! InfluxDB line protocol 인코더.
//!
//! `<measurement>,<tag>=<v>,... player_data=<n>u <unix_secs>` 형식으로 한 포인트당 한 줄.
//! 태그는 키 순서로 정렬된다 (`BTreeMap`).

use seichi_stats_core::models::point::{ConvertedPoint, FieldValue, FlushBatch};
use std::fmt::Write;

/// 배치 전체를 줄 단위 본문으로 인코딩
pub fn encode_batch(batch: &FlushBatch) -> String {
    let mut out = String::with_capacity(batch.len() * 128);
    for point in batch.points() {
        encode_point(point, &mut out);
    }
    out
}

/// 포인트 하나를 `out` 뒤에 한 줄로 추가
pub fn encode_point(point: &ConvertedPoint, out: &mut String) {
    escape_into(out, point.measurement(), &[',', ' ']);

    for (key, value) in point.tags() {
        out.push(',');
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        escape_into(out, value, &[',', '=', ' ']);
    }

    let mut first = true;
    for (key, value) in point.fields() {
        out.push(if first { ' ' } else { ',' });
        first = false;
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        // String에 대한 write!는 실패하지 않는다
        let _ = match value {
            FieldValue::UInt(v) => write!(out, "{v}u"),
            FieldValue::Int(v) => write!(out, "{v}i"),
            FieldValue::Float(v) => write!(out, "{v}"),
        };
    }

    let _ = writeln!(out, " {}", point.timestamp().timestamp());
}

fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
