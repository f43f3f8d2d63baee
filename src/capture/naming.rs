//! Destination file names: `<prefix>_<yyyyMMdd_HHmmss>[_<lat>_<lon>].jpg`.

use chrono::{DateTime, Local};

use crate::location::LocationFix;

/// Build the file name for a photo taken at `taken_at`.
///
/// Coordinates use fixed 5-decimal precision, latitude first.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use voice_capture::capture::naming::photo_file_name;
/// use voice_capture::location::LocationFix;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(photo_file_name("IMG", &at, None), "IMG_20240309_140507.jpg");
///
/// let fix = LocationFix::new(12.34567, -98.76543, 5.0);
/// assert_eq!(
///     photo_file_name("IMG", &at, Some(&fix)),
///     "IMG_20240309_140507_12.34567_-98.76543.jpg"
/// );
/// ```
pub fn photo_file_name(prefix: &str, taken_at: &DateTime<Local>, fix: Option<&LocationFix>) -> String {
    let stamp = taken_at.format("%Y%m%d_%H%M%S");
    match fix {
        Some(fix) => format!(
            "{prefix}_{stamp}_{:.5}_{:.5}.jpg",
            fix.latitude, fix.longitude
        ),
        None => format!("{prefix}_{stamp}.jpg"),
    }
}

/// `file_name` with `_<n>` inserted before its extension.
///
/// ```
/// use voice_capture::capture::naming::numbered_file_name;
///
/// assert_eq!(numbered_file_name("IMG_20240309_140507.jpg", 2), "IMG_20240309_140507_2.jpg");
/// ```
pub fn numbered_file_name(file_name: &str, n: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{file_name}_{n}"),
    }
}
