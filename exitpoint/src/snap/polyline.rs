//! Decoder for the Google/OSRM encoded polyline format (precision 1e-5).

use super::SnapError;

/// Decode an encoded polyline into `(lat, lng)` pairs.
///
/// Returns `SnapError::Malformed` when the string ends mid-number or
/// contains bytes outside the encoding alphabet.
pub fn decode_polyline(encoded: &str) -> Result<Vec<(f64, f64)>, SnapError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (dlat, next) = decode_value(bytes, index)?;
        let (dlng, next) = decode_value(bytes, next)?;
        index = next;

        lat += dlat;
        lng += dlng;
        points.push((lat as f64 / 1e5, lng as f64 / 1e5));
    }

    Ok(points)
}

/// Decode one zigzag varint starting at `index`; returns (value, next index).
fn decode_value(bytes: &[u8], mut index: usize) -> Result<(i64, usize), SnapError> {
    let mut shift = 0u32;
    let mut result: i64 = 0;

    loop {
        let Some(&b) = bytes.get(index) else {
            return Err(SnapError::Malformed(
                "polyline truncated mid-value".to_string(),
            ));
        };
        if b < 63 {
            return Err(SnapError::Malformed(format!(
                "invalid polyline byte 0x{:02x}",
                b
            )));
        }
        index += 1;

        // 12 chunks of 5 bits already exceed any 1e-5 coordinate delta.
        if shift > 60 {
            return Err(SnapError::Malformed(
                "polyline varint too long".to_string(),
            ));
        }

        let chunk = (b - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok((value, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_vector() {
        // Reference example from the polyline algorithm documentation.
        let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(points.len(), 3);

        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        for (got, want) in points.iter().zip(expected.iter()) {
            assert!((got.0 - want.0).abs() < 1e-5, "{:?} vs {:?}", got, want);
            assert!((got.1 - want.1).abs() < 1e-5, "{:?} vs {:?}", got, want);
        }
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_fails() {
        // Continuation bit set on the final byte.
        let result = decode_polyline("_p~iF~ps|U_");
        assert!(matches!(result, Err(SnapError::Malformed(_))));
    }

    #[test]
    fn test_decode_overlong_varint_fails() {
        // A run of continuation bytes never terminating the varint.
        let result = decode_polyline("~~~~~~~~~~~~~~~");
        assert!(matches!(result, Err(SnapError::Malformed(_))));
    }

    #[test]
    fn test_decode_invalid_byte_fails() {
        let result = decode_polyline("\u{1}abc");
        assert!(matches!(result, Err(SnapError::Malformed(_))));
    }
}
