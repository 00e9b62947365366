//! Landmark frames and the wire decoder
//!
//! A frame is the 21 tracked hand landmarks sent by the tracking process as
//! one UDP datagram. The payload is a UTF-8 JSON array of 63 numbers laid
//! out as `[x0, y0, z0, x1, y1, z1, ...]` in joint-index order.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tracked landmarks in a hand frame
pub const LANDMARK_COUNT: usize = 21;

/// Number of scalar values in a hand frame (x, y, z per landmark)
pub const VALUE_COUNT: usize = LANDMARK_COUNT * 3;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Payload is not a JSON number array: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Expected {expected} landmark values, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("Landmark value {index} is not finite")]
    NonFinite { index: usize },
}

/// One complete set of hand landmarks in the sender's normalized coordinates
///
/// Only constructible from exactly [`VALUE_COUNT`] values, so a frame held
/// downstream of the decoder is always whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct LandmarkFrame {
    values: [f32; VALUE_COUNT],
}

impl LandmarkFrame {
    /// Build a frame from a flat coordinate slice
    ///
    /// Every value must be finite.
    pub fn from_slice(values: &[f32]) -> Result<Self, FrameError> {
        let values: [f32; VALUE_COUNT] =
            values.try_into().map_err(|_| FrameError::WrongLength {
                expected: VALUE_COUNT,
                actual: values.len(),
            })?;
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(FrameError::NonFinite { index });
        }
        Ok(Self { values })
    }

    /// Build a frame from per-landmark points
    pub fn from_points(points: &[Vec3; LANDMARK_COUNT]) -> Self {
        let mut values = [0.0; VALUE_COUNT];
        for (chunk, point) in values.chunks_exact_mut(3).zip(points) {
            chunk.copy_from_slice(&point.to_array());
        }
        Self { values }
    }

    /// Raw landmark coordinate of joint `index`
    ///
    /// Returns `None` when `index` is not a landmark index.
    pub fn landmark(&self, index: usize) -> Option<Vec3> {
        if index >= LANDMARK_COUNT {
            return None;
        }
        let base = index * 3;
        Some(Vec3::new(
            self.values[base],
            self.values[base + 1],
            self.values[base + 2],
        ))
    }

    /// Iterate the landmarks in joint-index order
    pub fn landmarks(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.values
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
    }

    pub fn values(&self) -> &[f32; VALUE_COUNT] {
        &self.values
    }
}

impl TryFrom<Vec<f32>> for LandmarkFrame {
    type Error = FrameError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<LandmarkFrame> for Vec<f32> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.values.to_vec()
    }
}

/// Decode one datagram payload into a frame
///
/// Anything that is not a JSON array of exactly [`VALUE_COUNT`] numbers is
/// rejected as a whole. Numbers outside the `f32` range narrow to infinity
/// and are rejected too.
pub fn decode_frame(payload: &[u8]) -> Result<LandmarkFrame, DecodeError> {
    let values: Vec<f32> = serde_json::from_slice(payload)?;
    Ok(LandmarkFrame::from_slice(&values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Vec<u8> {
        let values: Vec<f32> = (0..len).map(|i| i as f32 * 0.25).collect();
        serde_json::to_vec(&values).unwrap()
    }

    #[test]
    fn test_decode_valid_frame() {
        let frame = decode_frame(&payload(VALUE_COUNT)).unwrap();
        assert_eq!(frame.values().len(), VALUE_COUNT);
        assert_eq!(frame.landmark(1), Some(Vec3::new(0.75, 1.0, 1.25)));
    }

    #[test]
    fn test_decode_wrong_lengths() {
        for len in [0, 62, 64] {
            match decode_frame(&payload(len)) {
                Err(DecodeError::Frame(FrameError::WrongLength { expected, actual })) => {
                    assert_eq!(expected, VALUE_COUNT);
                    assert_eq!(actual, len);
                }
                other => panic!("length {} should be rejected, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_decode_malformed_payloads() {
        let cases: [&[u8]; 5] = [
            b"",
            b"not json",
            b"{\"x\": 1.0}",
            b"[0.1, \"0.2\", 0.3]",
            &[0xff, 0xfe, 0x5b, 0x5d],
        ];
        for case in cases {
            assert!(
                matches!(decode_frame(case), Err(DecodeError::Malformed(_))),
                "payload {:?} should be malformed",
                case
            );
        }
    }

    #[test]
    fn test_decode_out_of_range_values() {
        let mut values = vec![String::from("1e39")];
        values.extend(std::iter::repeat(String::from("0.5")).take(VALUE_COUNT - 1));
        let text = format!("[{}]", values.join(", "));
        match decode_frame(text.as_bytes()) {
            Err(DecodeError::Frame(FrameError::NonFinite { index })) => assert_eq!(index, 0),
            other => panic!("1e39 should be rejected, got {:?}", other),
        }

        let mut values = vec![0.5f32; VALUE_COUNT];
        values[40] = f32::NEG_INFINITY;
        assert_eq!(
            LandmarkFrame::from_slice(&values),
            Err(FrameError::NonFinite { index: 40 })
        );
        values[40] = f32::NAN;
        assert_eq!(
            LandmarkFrame::from_slice(&values),
            Err(FrameError::NonFinite { index: 40 })
        );
    }

    #[test]
    fn test_decode_sender_format() {
        // Python's json.dumps output, integers and exponents included
        let mut text = String::from("[0.5, 0.5, 0, 1, 2.5e-1, -0.125");
        for _ in 2..LANDMARK_COUNT {
            text.push_str(", 0.25, 0.75, -0.0625");
        }
        text.push(']');

        let frame = decode_frame(text.as_bytes()).unwrap();
        assert_eq!(frame.landmark(0), Some(Vec3::new(0.5, 0.5, 0.0)));
        assert_eq!(frame.landmark(1), Some(Vec3::new(1.0, 0.25, -0.125)));
        assert_eq!(frame.landmark(20), Some(Vec3::new(0.25, 0.75, -0.0625)));
        assert_eq!(frame.landmark(21), None);
    }

    #[test]
    fn test_from_points_matches_landmarks() {
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (i, p) in points.iter_mut().enumerate() {
            *p = Vec3::new(i as f32, -(i as f32), 0.5);
        }
        let frame = LandmarkFrame::from_points(&points);
        let collected: Vec<Vec3> = frame.landmarks().collect();
        assert_eq!(collected, points.to_vec());
    }
}
