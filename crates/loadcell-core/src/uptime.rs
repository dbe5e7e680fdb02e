use std::time::Duration;

/// Renders an elapsed duration in the ISO-8601 form the reference wire
/// format uses for `appUptime`: `PT1H2M3.456S`, with zero hour and
/// minute components dropped and `PT0S` for a zero duration.
#[must_use]
pub fn format_iso8601(elapsed: Duration) -> String {
    let total_millis = elapsed.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if millis > 0 {
        out.push_str(&format!("{seconds}.{millis:03}S"));
    } else if seconds > 0 || out.len() == 2 {
        out.push_str(&format!("{seconds}S"));
    }
    out
}
