//! InfluxDB line protocol encoder
//!
//! `<measurement>,<tag>=<v>,... <field>=<v>,... <timestamp_ms>`
//!
//! Tags are written in key order, floats in shortest round-trip form and
//! the bounce counter as an integer field (`0i`).

use std::fmt::Write;

use contracts::{Point, FIELD_BOUNCE, FIELD_X, FIELD_Y};

/// Encode a batch, one line per point
pub fn encode_batch(measurement: &str, points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 96);
    for point in points {
        encode_point(measurement, point, &mut out);
        out.push('\n');
    }
    out
}

/// Append one point (without trailing newline)
pub fn encode_point(measurement: &str, point: &Point, out: &mut String) {
    escape_into(measurement, &[',', ' '], out);
    for (key, value) in point.tags() {
        out.push(',');
        escape_into(key, &[',', '=', ' '], out);
        out.push('=');
        escape_into(value, &[',', '=', ' '], out);
    }

    let _ = write!(out, " {FIELD_X}={},{FIELD_Y}={}", point.x, point.y);
    if let Some(bounce) = point.bounce {
        let _ = write!(out, ",{FIELD_BOUNCE}={bounce}i");
    }
    let _ = write!(out, " {}", point.timestamp_ms);
}

fn escape_into(raw: &str, special: &[char], out: &mut String) {
    for c in raw.chars() {
        if special.contains(&c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}
