//! Remote file attributes, parsed out of an `OsAdapter::list_file` command's
//! output.
//!
//! Narrowed to the Unix `ls -l --time-style long-iso` format
//! `UnixAdapter`/`LinuxAdapter`/`BusyBoxAdapter` actually produce (the only
//! profiles whose `list_file` isn't `not_supported`).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Size and modification time of a remote file, as reported by the shell's
/// own directory listing command.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttributes {
    pub filename: String,
    pub size: u64,
    pub mtime: Option<DateTime<Utc>>,
}

/// Parses one `ls -l --time-style long-iso <path>` result line:
/// `-rw-r--r-- 1 root root 1234 2024-03-01 10:15 /tmp/a.bin`.
pub fn parse_unix_list_file(output: &str, file_path: &str) -> Option<FileAttributes> {
    let line = output
        .lines()
        .find(|l| l.contains(file_path))
        .or_else(|| output.lines().rev().find(|l| !l.trim().is_empty()))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 {
        return None;
    }
    let size: u64 = fields[4].parse().ok()?;
    let date = fields[5];
    let time = fields[6];
    let mtime = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive));
    Some(FileAttributes {
        filename: file_path.to_string(),
        size,
        mtime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_and_mtime() {
        let out = "-rw-r--r-- 1 root root 1234 2024-03-01 10:15 /tmp/a.bin\n";
        let attrs = parse_unix_list_file(out, "/tmp/a.bin").unwrap();
        assert_eq!(attrs.size, 1234);
        assert!(attrs.mtime.is_some());
    }

    #[test]
    fn returns_none_on_malformed_line() {
        assert!(parse_unix_list_file("total 0\n", "/tmp/missing").is_none());
    }
}
