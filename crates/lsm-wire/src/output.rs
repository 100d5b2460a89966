//! Light output layout produced by the engine
//!
//! Output = Array count (u16 LE) + Arrays
//! Array  = Strip ID (1) + Light count (u16 LE) + Color format (1) + Light data
//!
//! Only RGB light data is decoded. RGBW and RGBWW arrays are skipped by their
//! known width. An unknown color format has no known width, so decoding stops
//! at that array and the output is marked incomplete.

use bytes::{BufMut, Bytes, BytesMut};
use lsm_core::{LsmError, LsmResult};
use tracing::warn;

use crate::FrameCursor;

/// Color format of one light array
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputColorFormat {
    Rgb,
    Rgbw,
    Rgbww,
    Unknown(u8),
}

impl OutputColorFormat {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => OutputColorFormat::Rgb,
            10 => OutputColorFormat::Rgbw,
            11 => OutputColorFormat::Rgbww,
            other => OutputColorFormat::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            OutputColorFormat::Rgb => 0,
            OutputColorFormat::Rgbw => 10,
            OutputColorFormat::Rgbww => 11,
            OutputColorFormat::Unknown(b) => b,
        }
    }

    /// Bytes per light, if known
    pub fn bytes_per_light(self) -> Option<usize> {
        match self {
            OutputColorFormat::Rgb => Some(3),
            OutputColorFormat::Rgbw => Some(4),
            OutputColorFormat::Rgbww => Some(5),
            OutputColorFormat::Unknown(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Light data of one array
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LightData {
    /// Decoded RGB lights
    Rgb(Vec<Rgb>),
    /// Recognised but undecoded light data
    Raw(Bytes),
}

/// One light strip
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightArray {
    pub strip_id: u8,
    pub num_lights: u16,
    pub format: OutputColorFormat,
    pub data: LightData,
}

impl LightArray {
    pub fn rgb(strip_id: u8, lights: Vec<Rgb>) -> Self {
        LightArray {
            strip_id,
            num_lights: lights.len() as u16,
            format: OutputColorFormat::Rgb,
            data: LightData::Rgb(lights),
        }
    }

    pub fn lights(&self) -> &[Rgb] {
        match &self.data {
            LightData::Rgb(lights) => lights,
            LightData::Raw(_) => &[],
        }
    }

    fn data_len(&self) -> usize {
        match &self.data {
            LightData::Rgb(lights) => lights.len() * 3,
            LightData::Raw(raw) => raw.len(),
        }
    }
}

/// Decoded light output
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LightOutput {
    /// Array count declared in the buffer
    pub declared_arrays: u16,
    pub arrays: Vec<LightArray>,
    /// False if decoding stopped at an unknown color format
    pub complete: bool,
}

impl LightOutput {
    pub fn new(arrays: Vec<LightArray>) -> Self {
        LightOutput {
            declared_arrays: arrays.len() as u16,
            arrays,
            complete: true,
        }
    }

    /// Decode an output buffer
    pub fn parse(buf: &[u8]) -> LsmResult<Self> {
        let mut cursor = FrameCursor::new(buf);
        let declared_arrays = cursor.read_u16_le()?;
        let mut arrays = Vec::with_capacity(declared_arrays as usize);

        for _ in 0..declared_arrays {
            let strip_id = cursor.read_u8()?;
            let num_lights = cursor.read_u16_le()?;
            let format = OutputColorFormat::from_byte(cursor.read_u8()?);

            let Some(width) = format.bytes_per_light() else {
                warn!(strip_id, format = format.to_byte(), "unknown output format, stopping decode");
                return Ok(LightOutput {
                    declared_arrays,
                    arrays,
                    complete: false,
                });
            };

            let raw = cursor.read_bytes(num_lights as usize * width)?;
            let data = match format {
                OutputColorFormat::Rgb => LightData::Rgb(
                    raw.chunks_exact(3)
                        .map(|c| Rgb::new(c[0], c[1], c[2]))
                        .collect(),
                ),
                _ => LightData::Raw(Bytes::copy_from_slice(raw)),
            };

            arrays.push(LightArray {
                strip_id,
                num_lights,
                format,
                data,
            });
        }

        Ok(LightOutput {
            declared_arrays,
            arrays,
            complete: true,
        })
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        2 + self.arrays.iter().map(|a| 4 + a.data_len()).sum::<usize>()
    }

    /// Encode into a new buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u16_le(self.arrays.len() as u16);
        for array in &self.arrays {
            buf.put_u8(array.strip_id);
            buf.put_u16_le(array.num_lights);
            buf.put_u8(array.format.to_byte());
            match &array.data {
                LightData::Rgb(lights) => {
                    for light in lights {
                        buf.put_slice(&[light.r, light.g, light.b]);
                    }
                }
                LightData::Raw(raw) => buf.put_slice(raw),
            }
        }
        buf.freeze()
    }

    /// Encode into `out`, returning the number of bytes written
    pub fn write_to(&self, out: &mut [u8]) -> LsmResult<usize> {
        let bytes = self.to_bytes();
        if out.len() < bytes.len() {
            return Err(LsmError::BufferTooShort {
                expected: bytes.len(),
                actual: out.len(),
            });
        }
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}
