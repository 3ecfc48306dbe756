//! PNG predictor decoding, as used by `/DecodeParms` with `/Predictor` 10..15.
//!
//! Cross-reference streams are almost always stored Flate-compressed with the
//! Up predictor applied row-wise; the row width follows from `/Columns`.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
}

impl TryFrom<u8> for FilterType {
    type Error = ();

    fn try_from(n: u8) -> std::result::Result<FilterType, ()> {
        match n {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Avg),
            4 => Ok(FilterType::Paeth),
            _ => Err(()),
        }
    }
}

fn paeth_predict(left: u8, above: u8, upper_left: u8) -> u8 {
    let expand_left = i16::from(left);
    let expand_above = i16::from(above);
    let expand_upper_left = i16::from(upper_left);

    let initial_estimate = expand_left + expand_above - expand_upper_left;

    let dist_left = (initial_estimate - expand_left).abs();
    let dist_above = (initial_estimate - expand_above).abs();
    let dist_upper_left = (initial_estimate - expand_upper_left).abs();

    if dist_left <= dist_above && dist_left <= dist_upper_left {
        left
    } else if dist_above <= dist_upper_left {
        above
    } else {
        upper_left
    }
}

pub fn decode_row(filter: FilterType, bpp: usize, previous: &[u8], current: &mut [u8]) {
    use self::FilterType::*;
    let len = current.len();
    let bpp = bpp.min(len);

    match filter {
        None => (),
        Sub => {
            for i in bpp..len {
                current[i] = current[i].wrapping_add(current[i - bpp]);
            }
        }
        Up => {
            for i in 0..len {
                current[i] = current[i].wrapping_add(previous[i]);
            }
        }
        Avg => {
            for i in 0..bpp {
                current[i] = current[i].wrapping_add(previous[i] / 2);
            }
            for i in bpp..len {
                current[i] = current[i].wrapping_add((i16::from(current[i - bpp]) + i16::from(previous[i]) / 2) as u8);
            }
        }
        Paeth => {
            for i in 0..bpp {
                current[i] = current[i].wrapping_add(paeth_predict(0, previous[i], 0));
            }
            for i in bpp..len {
                current[i] = current[i].wrapping_add(paeth_predict(current[i - bpp], previous[i], previous[i - bpp]));
            }
        }
    }
}

/// Decode a whole predictor-filtered block. Each row is prefixed with one
/// filter type byte; a truncated final row is an error.
pub fn decode_frame(content: &[u8], bytes_per_pixel: usize, pixels_per_row: usize) -> Result<Vec<u8>> {
    let bytes_per_row = bytes_per_pixel
        .checked_mul(pixels_per_row)
        .filter(|len| *len > 0)
        .ok_or_else(|| Error::InvalidStream("invalid predictor row width".to_string()))?;

    let mut previous = vec![0_u8; bytes_per_row];
    let mut current = vec![0_u8; bytes_per_row];
    let mut decoded = Vec::with_capacity(content.len());

    for row in content.chunks(1 + bytes_per_row) {
        let (&filter_byte, data) = row
            .split_first()
            .ok_or_else(|| Error::InvalidStream("empty predictor row".to_string()))?;
        let filter = FilterType::try_from(filter_byte)
            .map_err(|_| Error::InvalidStream(format!("invalid PNG filter type ({})", filter_byte)))?;
        if data.len() != bytes_per_row {
            return Err(Error::InvalidStream("truncated predictor row".to_string()));
        }

        current.copy_from_slice(data);
        decode_row(filter, bytes_per_pixel, previous.as_slice(), current.as_mut_slice());
        decoded.extend_from_slice(current.as_slice());
        std::mem::swap(&mut previous, &mut current);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_up_rows() {
        // Two rows of width 3, second row stored as deltas against the first.
        let content = [2, 1, 2, 3, 2, 1, 1, 1];
        let decoded = decode_frame(&content, 1, 3).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn decode_sub_row() {
        let content = [1, 10, 5, 5];
        let decoded = decode_frame(&content, 1, 3).unwrap();
        assert_eq!(decoded, vec![10, 15, 20]);
    }

    #[test]
    fn reject_unknown_filter() {
        let content = [9, 0, 0, 0];
        assert!(decode_frame(&content, 1, 3).is_err());
    }

    #[test]
    fn reject_truncated_row() {
        let content = [0, 1, 2, 3, 0, 1];
        assert!(decode_frame(&content, 1, 3).is_err());
    }
}
