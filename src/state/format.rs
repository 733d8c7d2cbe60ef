//! Display helpers for record metadata

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = MIB * 1024.0;

const UNITS: [(&str, i64); 7] = [
    ("decade", 315_569_260),
    ("year", 31_556_926),
    ("month", 2_629_743),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// Human relative age of a unix timestamp, e.g. "3 days ago"
pub fn relative_time(timestamp: i64, now: i64) -> String {
    let diff = now - timestamp;

    if diff < 600 {
        return "Just Now".to_string();
    }

    for (name, secs) in UNITS {
        if diff >= secs {
            let value = diff / secs;
            let plural = if value > 1 { "s" } else { "" };
            return format!("{} {}{} ago", value, name, plural);
        }
    }

    "A Long Time Ago...".to_string()
}

pub fn megabytes(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / MIB)
}

pub fn gigabytes(bytes: u64) -> String {
    format!("{:.2}GB", bytes as f64 / GIB)
}
