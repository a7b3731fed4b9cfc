//! Capture-time probing: embedded metadata first, then the file name.

use std::{
    fs::File,
    io::BufReader,
    path::Path,
    process::{Command, Stdio},
    sync::LazyLock,
    thread,
    time::{Duration, Instant},
};

use time::{
    Date, Month, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use regex::{Captures, Regex};
use tracing::debug;

use crate::media::MediaType;

const FFPROBE_TIMEOUT: Duration = Duration::from_secs(3);
const FFPROBE_POLL: Duration = Duration::from_millis(20);

/// Best-effort capture time for a media file.
pub(crate) fn capture_datetime(path: &Path, media_type: MediaType) -> Option<OffsetDateTime> {
    let embedded = match media_type {
        MediaType::Image => exif_datetime(path),
        MediaType::Video => ffprobe_creation_time(path),
    };
    embedded.or_else(|| {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_filename_datetime)
    })
}

/// Whole days between `birth` and `captured`, never negative.
pub fn age_in_days(captured: OffsetDateTime, birth: OffsetDateTime) -> u32 {
    let days = (captured - birth).whole_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

fn exif_datetime(path: &Path) -> Option<OffsetDateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable EXIF block");
            return None;
        }
    };

    [
        exif::Tag::DateTimeOriginal,
        exif::Tag::DateTimeDigitized,
        exif::Tag::DateTime,
    ]
    .into_iter()
    .find_map(|tag| {
        let field = exif.get_field(tag, exif::In::PRIMARY)?;
        match &field.value {
            exif::Value::Ascii(values) => values.first().and_then(|raw| parse_exif_ascii(raw)),
            _ => None,
        }
    })
}

/// Parse the EXIF `YYYY:MM:DD HH:MM:SS` layout as UTC.
fn parse_exif_ascii(raw: &[u8]) -> Option<OffsetDateTime> {
    let text = std::str::from_utf8(raw).ok()?.trim_end_matches('\0').trim();
    let format = format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(text, format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn ffprobe_creation_time(path: &Path) -> Option<OffsetDateTime> {
    let mut child = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format_tags=creation_time:stream_tags=creation_time",
            "-of",
            "default=nw=1:nk=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| debug!(error = %err, "ffprobe unavailable"))
        .ok()?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if started.elapsed() >= FFPROBE_TIMEOUT => {
                debug!(path = %path.display(), "ffprobe timed out");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(FFPROBE_POLL),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "ffprobe wait failed");
                return None;
            }
        }
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(parse_probe_datetime)
}

/// Parse the timestamp shapes ffprobe emits for `creation_time`.
pub(crate) fn parse_probe_datetime(raw: &str) -> Option<OffsetDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(parsed.to_offset(time::UtcOffset::UTC));
    }

    let with_offset =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]");
    if let Ok(parsed) = OffsetDateTime::parse(text, with_offset) {
        return Some(parsed.to_offset(time::UtcOffset::UTC));
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    ];
    naive_formats.iter().find_map(|format| {
        PrimitiveDateTime::parse(text, format)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

/// `YYYYMMDD`, an optional `_`/`-`, then `HHMMSS`.
static STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20[0-9]{2})([0-9]{2})([0-9]{2})[_-]?([0-9]{2})([0-9]{2})([0-9]{2})")
        .expect("stamp pattern compiles")
});
/// `YYYY`, optional separator, `MM`, optional separator, `DD`.
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20[0-9]{2})[-_]?([0-9]{2})[-_]?([0-9]{2})").expect("date pattern compiles")
});

/// Extract a capture time from names like `PXL_20250128_093012.jpg` or `2025-01-28.png`.
///
/// The first full stamp wins when it is a valid date and time; otherwise the
/// first date-like run is used at midnight UTC. Only years 2000-2099 are recognised.
pub fn parse_filename_datetime(name: &str) -> Option<OffsetDateTime> {
    if let Some(stamp) = STAMP.captures(name).and_then(|caps| {
        build_datetime(
            field(&caps, 1)?,
            field(&caps, 2)?,
            field(&caps, 3)?,
            field(&caps, 4)?,
            field(&caps, 5)?,
            field(&caps, 6)?,
        )
    }) {
        return Some(stamp);
    }

    let caps = DATE.captures(name)?;
    build_datetime(field(&caps, 1)?, field(&caps, 2)?, field(&caps, 3)?, 0, 0, 0)
}

fn field(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn build_datetime(y: u32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<OffsetDateTime> {
    let month = Month::try_from(u8::try_from(mo).ok()?).ok()?;
    let date = Date::from_calendar_date(i32::try_from(y).ok()?, month, u8::try_from(d).ok()?).ok()?;
    let clock = Time::from_hms(
        u8::try_from(h).ok()?,
        u8::try_from(mi).ok()?,
        u8::try_from(s).ok()?,
    )
    .ok()?;
    Some(PrimitiveDateTime::new(date, clock).assume_utc())
}
