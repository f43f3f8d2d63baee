//! Minimal EXIF GPS writer.
//!
//! Produces an `APP1` segment holding a big-endian TIFF structure with a
//! single IFD0 entry (the GPS IFD pointer) and a GPS IFD with version,
//! latitude and longitude:
//!
//! ```text
//! offset  0  "MM" 002A 00000008          TIFF header
//!         8  IFD0: 1 entry               GPSInfo (0x8825) → 26
//!        26  GPS IFD: 5 entries          VersionID, LatRef, Lat, LonRef, Lon
//!        92  Lat  3 × RATIONAL
//!       116  Lon  3 × RATIONAL
//!       140  end
//! ```
//!
//! Coordinates are written as whole degrees, minutes and seconds, each a
//! rational with denominator 1.

use crate::location::LocationFix;

use super::EnrichError;

const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_GPS_IFD: u16 = 0x8825;
const TAG_GPS_VERSION: u16 = 0x0000;
const TAG_GPS_LAT_REF: u16 = 0x0001;
const TAG_GPS_LAT: u16 = 0x0002;
const TAG_GPS_LON_REF: u16 = 0x0003;
const TAG_GPS_LON: u16 = 0x0004;

const GPS_IFD_OFFSET: u32 = 26;
const LAT_OFFSET: u32 = 92;
const LON_OFFSET: u32 = 116;

// ---------------------------------------------------------------------------
// Degrees / minutes / seconds
// ---------------------------------------------------------------------------

/// Whole degrees, minutes and seconds of an unsigned coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Dms {
    /// `degrees + minutes / 60 + seconds / 3600`.
    pub fn to_decimal(&self) -> f64 {
        self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds as f64 / 3600.0
    }
}

/// Split `|coord|` into truncated degrees, minutes and seconds.
///
/// ```
/// use voice_capture::enrich::exif::{to_dms, Dms};
///
/// assert_eq!(
///     to_dms(-98.76543),
///     Dms { degrees: 98, minutes: 45, seconds: 55 }
/// );
/// ```
pub fn to_dms(coord: f64) -> Dms {
    let abs = coord.abs();
    let degrees = abs.floor();
    let minutes = (abs - degrees) * 60.0;
    let whole_minutes = minutes.floor();
    let seconds = ((minutes - whole_minutes) * 60.0).floor();
    Dms {
        degrees: degrees as u32,
        minutes: whole_minutes as u32,
        seconds: seconds as u32,
    }
}

pub fn latitude_ref(latitude: f64) -> char {
    if latitude < 0.0 {
        'S'
    } else {
        'N'
    }
}

pub fn longitude_ref(longitude: f64) -> char {
    if longitude < 0.0 {
        'W'
    } else {
        'E'
    }
}

// ---------------------------------------------------------------------------
// Segment encoding
// ---------------------------------------------------------------------------

/// Build a complete `APP1` segment (marker included) for `fix`.
pub fn gps_segment(fix: &LocationFix) -> Vec<u8> {
    let mut tiff = Vec::with_capacity(140);

    tiff.extend_from_slice(b"MM");
    put_u16(&mut tiff, 0x002A);
    put_u32(&mut tiff, 8);

    // IFD0
    put_u16(&mut tiff, 1);
    put_entry(&mut tiff, TAG_GPS_IFD, TYPE_LONG, 1, GPS_IFD_OFFSET.to_be_bytes());
    put_u32(&mut tiff, 0);

    // GPS IFD
    put_u16(&mut tiff, 5);
    put_entry(&mut tiff, TAG_GPS_VERSION, TYPE_BYTE, 4, [2, 2, 0, 0]);
    put_entry(&mut tiff, TAG_GPS_LAT_REF, TYPE_ASCII, 2, ascii_ref(latitude_ref(fix.latitude)));
    put_entry(&mut tiff, TAG_GPS_LAT, TYPE_RATIONAL, 3, LAT_OFFSET.to_be_bytes());
    put_entry(&mut tiff, TAG_GPS_LON_REF, TYPE_ASCII, 2, ascii_ref(longitude_ref(fix.longitude)));
    put_entry(&mut tiff, TAG_GPS_LON, TYPE_RATIONAL, 3, LON_OFFSET.to_be_bytes());
    put_u32(&mut tiff, 0);

    debug_assert_eq!(tiff.len(), LAT_OFFSET as usize);
    put_dms(&mut tiff, to_dms(fix.latitude));
    debug_assert_eq!(tiff.len(), LON_OFFSET as usize);
    put_dms(&mut tiff, to_dms(fix.longitude));

    let length = (2 + EXIF_HEADER.len() + tiff.len()) as u16;
    let mut segment = Vec::with_capacity(2 + length as usize);
    segment.extend_from_slice(&[0xFF, 0xE1]);
    put_u16(&mut segment, length);
    segment.extend_from_slice(EXIF_HEADER);
    segment.extend_from_slice(&tiff);
    segment
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    put_u16(buf, tag);
    put_u16(buf, kind);
    put_u32(buf, count);
    buf.extend_from_slice(&value);
}

fn put_dms(buf: &mut Vec<u8>, dms: Dms) {
    for part in [dms.degrees, dms.minutes, dms.seconds] {
        put_u32(buf, part);
        put_u32(buf, 1);
    }
}

fn ascii_ref(c: char) -> [u8; 4] {
    [c as u8, 0, 0, 0]
}

// ---------------------------------------------------------------------------
// Segment insertion
// ---------------------------------------------------------------------------

/// Return `jpeg` with `segment` inserted after SOI (or after a leading
/// JFIF `APP0`) and any existing EXIF `APP1` removed.
pub fn insert_gps_segment(jpeg: &[u8], segment: &[u8]) -> Result<Vec<u8>, EnrichError> {
    if jpeg.len() < 4 || jpeg[0] != 0xFF || jpeg[1] != 0xD8 {
        return Err(EnrichError::Malformed("missing start-of-image marker"));
    }

    // Leading application segments as (start, end, is_exif, marker).
    let mut segments = Vec::new();
    let mut pos = 2;
    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF && (0xE0..=0xEF).contains(&jpeg[pos + 1]) {
        let marker = jpeg[pos + 1];
        let length = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        let end = pos + 2 + length;
        if length < 2 || end > jpeg.len() {
            return Err(EnrichError::Malformed("truncated application segment"));
        }
        let is_exif = marker == 0xE1 && jpeg[pos + 4..end].starts_with(EXIF_HEADER);
        segments.push((pos, end, is_exif, marker));
        pos = end;
    }

    let insert_at = match segments.first() {
        Some(&(_, _, _, 0xE0)) => 1,
        _ => 0,
    };

    let mut out = Vec::with_capacity(jpeg.len() + segment.len());
    out.extend_from_slice(&jpeg[..2]);
    for (i, &(start, end, is_exif, _)) in segments.iter().enumerate() {
        if i == insert_at {
            out.extend_from_slice(segment);
        }
        if !is_exif {
            out.extend_from_slice(&jpeg[start..end]);
        }
    }
    if insert_at >= segments.len() {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&jpeg[pos..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dms_of_sample_coordinates() {
        assert_eq!(
            to_dms(12.34567),
            Dms {
                degrees: 12,
                minutes: 20,
                seconds: 44
            }
        );
        assert_eq!(to_dms(0.0), Dms { degrees: 0, minutes: 0, seconds: 0 });
    }

    #[test]
    fn recombination_is_within_one_second() {
        for coord in [12.34567, -98.76543, 0.5, -45.0, 179.75, 51.477_928] {
            let back = to_dms(coord).to_decimal();
            assert!(
                (coord.abs() - back).abs() <= 1.0 / 3600.0,
                "{coord} → {back}"
            );
        }
    }

    #[test]
    fn hemisphere_refs() {
        assert_eq!(latitude_ref(12.3), 'N');
        assert_eq!(latitude_ref(-0.1), 'S');
        assert_eq!(longitude_ref(-98.7), 'W');
        assert_eq!(longitude_ref(0.0), 'E');
    }

    #[test]
    fn segment_layout() {
        let seg = gps_segment(&LocationFix::new(12.34567, -98.76543, 1.0));
        assert_eq!(&seg[..2], &[0xFF, 0xE1]);
        assert_eq!(u16::from_be_bytes([seg[2], seg[3]]) as usize, seg.len() - 2);
        assert_eq!(&seg[4..10], EXIF_HEADER);
        assert_eq!(seg.len(), 4 + 6 + 140);

        let tiff = &seg[10..];
        // LatRef / LonRef values live in the entry value fields.
        let lat_ref_entry = 26 + 2 + 12;
        assert_eq!(tiff[lat_ref_entry + 8], b'N');
        let lon_ref_entry = 26 + 2 + 3 * 12;
        assert_eq!(tiff[lon_ref_entry + 8], b'W');
    }

    #[test]
    fn inserted_after_app0_and_old_exif_dropped() {
        let app0 = [0xFF, 0xE0, 0x00, 0x04, 0xAA, 0xBB];
        let old_exif = [0xFF, 0xE1, 0x00, 0x08, b'E', b'x', b'i', b'f', 0, 0];
        let body = [0xFF, 0xDB, 0x00, 0x02, 0xFF, 0xD9];

        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&app0);
        jpeg.extend_from_slice(&old_exif);
        jpeg.extend_from_slice(&body);

        let seg = [0xFF, 0xE1, 0x00, 0x02];
        let out = insert_gps_segment(&jpeg, &seg).unwrap();

        let mut expected = vec![0xFF, 0xD8];
        expected.extend_from_slice(&app0);
        expected.extend_from_slice(&seg);
        expected.extend_from_slice(&body);
        assert_eq!(out, expected);
    }

    #[test]
    fn inserted_right_after_soi_without_app0() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x02, 0xFF, 0xD9];
        let seg = [0xFF, 0xE1, 0x00, 0x02];
        let out = insert_gps_segment(&jpeg, &seg).unwrap();
        assert_eq!(&out[2..6], &seg);
        assert_eq!(&out[6..], &jpeg[2..]);
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(matches!(
            insert_gps_segment(b"not a jpeg", &[]),
            Err(EnrichError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_truncated_segment() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x10, 0x00, 0x00];
        assert!(insert_gps_segment(&jpeg, &[]).is_err());
    }
}
