use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, trace};

/// Tried in order; the first one carrying a parseable date wins.
const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Read the capture time from a file's embedded metadata.
///
/// A file without EXIF data, or without any usable date tag, gives
/// `Ok(None)`. Only a file that cannot be opened or whose EXIF block is
/// corrupt is an error.
pub fn extract_exif_time(path: &Path) -> Result<Option<NaiveDateTime>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(&file);

    let exif = match Reader::new().read_from_container(&mut bufreader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) | Err(exif::Error::NotSupported(_)) => {
            debug!(path = %path.display(), "No EXIF metadata");
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::ExifRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    for tag in DATE_TAGS {
        if let Some(field) = exif.get_field(*tag, In::PRIMARY) {
            if let Some(datetime) = parse_exif_datetime(&field.display_value().to_string()) {
                trace!(path = %path.display(), %tag, "EXIF date found");
                return Ok(Some(datetime));
            }
        }
    }

    debug!(path = %path.display(), "No usable EXIF date tag");
    Ok(None)
}

/// Accepts the raw `YYYY:MM:DD HH:MM:SS` form as well as the
/// `YYYY-MM-DD HH:MM:SS` form the exif crate displays.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::tempdir;

    const DATE_TIME: u16 = 0x0132;
    const DATE_TIME_ORIGINAL: u16 = 0x9003;
    const DATE_TIME_DIGITIZED: u16 = 0x9004;

    fn push_entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        buf.extend_from_slice(&tag.to_be_bytes());
        buf.extend_from_slice(&kind.to_be_bytes());
        buf.extend_from_slice(&count.to_be_bytes());
        buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Big-endian TIFF with ASCII date tags in IFD0 (`primary`) and in the
    /// Exif IFD (`exif_ifd`). Dates are `YYYY:MM:DD HH:MM:SS`.
    fn tiff(primary: &[(u16, &str)], exif_ifd: &[(u16, &str)]) -> Vec<u8> {
        let ifd_len = |entries: usize| (2 + 12 * entries + 4) as u32;
        let has_exif_ifd = !exif_ifd.is_empty();
        let primary_entries = primary.len() + usize::from(has_exif_ifd);
        let exif_offset = 8 + ifd_len(primary_entries);
        let mut data_offset = exif_offset;
        if has_exif_ifd {
            data_offset += ifd_len(exif_ifd.len());
        }

        let mut buf = b"MM\x00\x2a".to_vec();
        buf.extend_from_slice(&8u32.to_be_bytes());
        let mut strings = Vec::new();

        buf.extend_from_slice(&(primary_entries as u16).to_be_bytes());
        for (tag, date) in primary {
            assert_eq!(date.len(), 19);
            push_entry(&mut buf, *tag, 2, 20, data_offset);
            data_offset += 20;
            strings.extend_from_slice(date.as_bytes());
            strings.push(0);
        }
        if has_exif_ifd {
            push_entry(&mut buf, 0x8769, 4, 1, exif_offset);
        }
        buf.extend_from_slice(&0u32.to_be_bytes());

        if has_exif_ifd {
            buf.extend_from_slice(&(exif_ifd.len() as u16).to_be_bytes());
            for (tag, date) in exif_ifd {
                assert_eq!(date.len(), 19);
                push_entry(&mut buf, *tag, 2, 20, data_offset);
                data_offset += 20;
                strings.extend_from_slice(date.as_bytes());
                strings.push(0);
            }
            buf.extend_from_slice(&0u32.to_be_bytes());
        }

        buf.extend_from_slice(&strings);
        buf
    }

    fn extract_from(bytes: Vec<u8>) -> Option<NaiveDateTime> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        fs::write(&path, bytes).unwrap();
        extract_exif_time(&path).unwrap()
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);

        let dt = parse_exif_datetime("\"2024-01-15 14:30:00\"").unwrap();
        assert_eq!(dt.day(), 15);

        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_extract_from_tiff() {
        let dt = extract_from(tiff(&[], &[(DATE_TIME_ORIGINAL, "2021:03:04 05:06:07")])).unwrap();
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 4);
    }

    #[test]
    fn test_date_time_only() {
        let dt = extract_from(tiff(&[(DATE_TIME, "2018:08:09 10:11:12")], &[])).unwrap();
        assert_eq!(dt.year(), 2018);
        assert_eq!(dt.month(), 8);
        assert_eq!(dt.day(), 9);
    }

    #[test]
    fn test_tag_priority() {
        let digitized = tiff(
            &[(DATE_TIME, "2018:08:09 10:11:12")],
            &[(DATE_TIME_DIGITIZED, "2017:07:08 09:10:11")],
        );
        assert_eq!(extract_from(digitized).unwrap().year(), 2017);

        let original = tiff(
            &[(DATE_TIME, "2018:08:09 10:11:12")],
            &[
                (DATE_TIME_ORIGINAL, "2016:06:07 08:09:10"),
                (DATE_TIME_DIGITIZED, "2017:07:08 09:10:11"),
            ],
        );
        assert_eq!(extract_from(original).unwrap().year(), 2016);
    }

    #[test]
    fn test_missing_exif_is_no_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, b"definitely not an image").unwrap();

        assert!(extract_exif_time(&path).unwrap_or(None).is_none());
    }

    #[test]
    fn test_unreadable_file_is_error() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            extract_exif_time(&dir.path().join("missing.jpg")),
            Err(Error::Io(_))
        ));
    }
}
