use {
    crate::error::Error,
    chrono::{DateTime, Local, TimeZone},
};

/// Granularity of time-based rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationUnit {
    Day,
    Hour,
    Minute,
    Second,
}

impl RotationUnit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'D' => Some(RotationUnit::Day),
            'H' => Some(RotationUnit::Hour),
            'M' => Some(RotationUnit::Minute),
            'S' => Some(RotationUnit::Second),
            _ => None,
        }
    }

    fn seconds(&self) -> i64 {
        match self {
            RotationUnit::Day => 86_400,
            RotationUnit::Hour => 3_600,
            RotationUnit::Minute => 60,
            RotationUnit::Second => 1,
        }
    }

    /// Backup suffix precision matches the unit.
    fn suffix_format(&self) -> &'static str {
        match self {
            RotationUnit::Day => "%Y-%m-%d",
            RotationUnit::Hour => "%Y-%m-%d_%H",
            RotationUnit::Minute => "%Y-%m-%d_%H%M",
            RotationUnit::Second => "%Y-%m-%d_%H%M%S",
        }
    }
}

/// Pure rotation time math: when the next rollover happens and how a rotated
/// backup is named. Immutable after parsing from configuration.
#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    unit: RotationUnit,
    interval: i64,
}

impl RotationPolicy {
    /// Parse an interval spec of the form `[count]Unit`, e.g. `3H` for every
    /// three hours or bare `D` for every day.
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let spec = spec.trim();
        let unit_char = spec
            .chars()
            .next_back()
            .ok_or_else(|| Error::Config("rotation interval is empty".to_owned()))?;
        let unit = RotationUnit::from_char(unit_char.to_ascii_uppercase())
            .ok_or_else(|| Error::Config(format!("unrecognized rotation unit '{unit_char}'")))?;
        let count_str = &spec[..spec.len() - unit_char.len_utf8()];
        let count: i64 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| Error::Config(format!("invalid rotation interval '{spec}'")))?
        };
        if count <= 0 {
            return Err(Error::Config(format!("invalid rotation interval '{spec}'")));
        }
        Ok(RotationPolicy {
            unit,
            interval: unit.seconds() * count,
        })
    }

    /// Interval between rotation boundaries, in seconds.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// The first rotation boundary strictly after `t`: truncate to the
    /// unit's granularity in local time, then step by the interval.
    pub fn next_rollover_at(&self, t: DateTime<Local>) -> i64 {
        let ts = t.timestamp();
        let mut at = self.floor_to_unit(t);
        while at <= ts {
            at += self.interval;
        }
        at
    }

    /// Walk backward from `rollover_at` in interval steps until the boundary
    /// is at or before the live file's modification time. That boundary names
    /// the backup.
    pub fn backup_boundary(&self, rollover_at: i64, modified: i64) -> i64 {
        let mut boundary = rollover_at;
        while boundary > modified {
            boundary -= self.interval;
        }
        boundary
    }

    pub fn backup_suffix(&self, boundary: i64) -> String {
        local_from_epoch(boundary).format(self.unit.suffix_format()).to_string()
    }

    fn floor_to_unit(&self, t: DateTime<Local>) -> i64 {
        let ts = t.timestamp();
        match self.unit {
            RotationUnit::Day => t
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
                .map(|dt| dt.timestamp())
                .unwrap_or_else(|| ts - ts.rem_euclid(86_400)),
            RotationUnit::Hour => ts - ts.rem_euclid(3_600),
            RotationUnit::Minute => ts - ts.rem_euclid(60),
            RotationUnit::Second => ts,
        }
    }
}

/// Epoch seconds back to local time. The instant-to-local mapping is total,
/// so the fallback is unreachable in practice.
pub(crate) fn local_from_epoch(secs: i64) -> DateTime<Local> {
    Local.timestamp_opt(secs, 0).single().unwrap_or_else(Local::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    #[test]
    fn daily_boundary_is_next_local_midnight() {
        let policy = RotationPolicy::parse("D").unwrap();
        let at = policy.next_rollover_at(local(2024, 1, 15, 23, 59, 59));
        assert_eq!(at, local(2024, 1, 16, 0, 0, 0).timestamp());
    }

    #[test]
    fn boundary_strictly_exceeds_reference() {
        let policy = RotationPolicy::parse("D").unwrap();
        let midnight = local(2024, 1, 16, 0, 0, 0);
        assert_eq!(policy.next_rollover_at(midnight), local(2024, 1, 17, 0, 0, 0).timestamp());
    }

    #[test]
    fn multiplier_scales_the_interval() {
        let policy = RotationPolicy::parse("3H").unwrap();
        assert_eq!(policy.interval(), 3 * 3_600);
        let at = policy.next_rollover_at(local(2024, 1, 15, 10, 30, 0));
        assert_eq!(at, local(2024, 1, 15, 13, 0, 0).timestamp());
    }

    #[test]
    fn parse_rejects_bad_specs() {
        assert!(RotationPolicy::parse("").is_err());
        assert!(RotationPolicy::parse("X").is_err());
        assert!(RotationPolicy::parse("0D").is_err());
        assert!(RotationPolicy::parse("-2H").is_err());
        assert!(RotationPolicy::parse("fooD").is_err());
    }

    #[test]
    fn parse_is_case_insensitive_on_the_unit() {
        assert_eq!(RotationPolicy::parse("2h").unwrap().interval(), 7_200);
    }

    #[test]
    fn backup_boundary_walks_back_to_modification_time() {
        let policy = RotationPolicy::parse("D").unwrap();
        let rollover_at = local(2024, 1, 16, 0, 0, 0).timestamp();
        let modified = local(2024, 1, 15, 14, 0, 0).timestamp();
        let boundary = policy.backup_boundary(rollover_at, modified);
        assert_eq!(boundary, local(2024, 1, 15, 0, 0, 0).timestamp());
        assert_eq!(policy.backup_suffix(boundary), "2024-01-15");
    }

    #[test]
    fn backup_boundary_stops_at_exact_modification_time() {
        let policy = RotationPolicy::parse("D").unwrap();
        let rollover_at = local(2024, 1, 16, 0, 0, 0).timestamp();
        let modified = local(2024, 1, 15, 0, 0, 0).timestamp();
        assert_eq!(policy.backup_boundary(rollover_at, modified), modified);
    }

    #[test]
    fn suffix_precision_tracks_the_unit() {
        let boundary = local(2024, 3, 5, 7, 8, 9).timestamp();
        assert_eq!(RotationPolicy::parse("H").unwrap().backup_suffix(boundary), "2024-03-05_07");
        assert_eq!(RotationPolicy::parse("M").unwrap().backup_suffix(boundary), "2024-03-05_0708");
        assert_eq!(
            RotationPolicy::parse("S").unwrap().backup_suffix(boundary),
            "2024-03-05_070809"
        );
    }
}
