/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC time as an RFC 3339 string with millisecond precision.
///
/// Used for `exportedAt` stamps, matching what the shop's web client wrote.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Random v4 UUID, lowercase hyphenated.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Human-readable local timestamp shown on receipts and in the login history
/// (e.g. `19 oct 2026, 14:05`).
pub fn display_date(at: chrono::DateTime<chrono::Local>) -> String {
    const MONTHS: [&str; 12] = [
        "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
    ];
    use chrono::{Datelike, Timelike};
    format!(
        "{:02} {} {}, {:02}:{:02}",
        at.day(),
        MONTHS[at.month0() as usize],
        at.year(),
        at.hour(),
        at.minute()
    )
}

/// Invoice folio: `F-YYYYMMDD-NNN` with a random three-digit suffix.
pub fn folio(at: chrono::DateTime<chrono::Local>) -> String {
    use rand::Rng;
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("F-{}-{:03}", at.format("%Y%m%d"), suffix)
}
