use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::binder::BinderRef;
use crate::reader::ParcelReader;
use crate::reply::{EX_NONE, EX_SERVICE_SPECIFIC};

/// Strict-mode policy word written ahead of every interface token.
pub const STRICT_MODE_HEADER: i32 = 0x4000_0000;

/// Work-source uid written ahead of every interface token (unset).
pub const WORK_SOURCE_UNSET: i32 = -1;

/// 'SYST' marker identifying a system-partition caller.
pub const SYSTEM_HEADER: i32 = 0x5359_5354;

/// Length prefix marking an absent string or array.
pub const ABSENT: i32 = -1;

pub(crate) const OBJECT_NULL: i32 = 0;
pub(crate) const OBJECT_REF: i32 = 1;

const INITIAL_CAPACITY: usize = 256;

/// An outbound or inbound transaction buffer.
///
/// Wire layout (all fields 4-byte aligned, little-endian):
/// ```text
/// ┌───────────────┬─────────────────┬──────────────────────────────┐
/// │ i32 / f32     │ 4 bytes         │                              │
/// │ string16      │ i32 len (-1)    │ (len + 1) u16 units, padded  │
/// │ i32[] / f32[] │ i32 count (-1)  │ count elements               │
/// │ String[]      │ i32 count (-1)  │ count string16 values        │
/// │ binder        │ i32 kind (0/1)  │ u32 object-table index       │
/// └───────────────┴─────────────────┴──────────────────────────────┘
/// ```
/// Binder objects travel out of band in the object table.
#[derive(Clone, Default)]
pub struct Parcel {
    data: BytesMut,
    objects: Vec<BinderRef>,
}

impl Parcel {
    /// Create an empty parcel.
    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(INITIAL_CAPACITY),
            objects: Vec::new(),
        }
    }

    /// Create a parcel over raw bytes with no binder objects.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
            objects: Vec::new(),
        }
    }

    /// Number of data bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no data has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw data bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Binder object at `index` in the object table.
    pub fn object(&self, index: u32) -> Option<&BinderRef> {
        self.objects.get(index as usize)
    }

    /// Number of binder objects carried by this parcel.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Start reading from the beginning of the parcel.
    pub fn reader(&self) -> ParcelReader<'_> {
        ParcelReader::new(self)
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.put_i32_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.put_u32_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.data.put_u32_le(value.to_bits());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    /// Write a string16, or the absent marker for `None`.
    pub fn write_string(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            self.write_i32(ABSENT);
            return;
        };

        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_i32(units.len() as i32);
        let start = self.data.len();
        for unit in units {
            self.data.put_u16_le(unit);
        }
        self.data.put_u16_le(0);
        self.pad_from(start);
    }

    pub fn write_i32_array(&mut self, values: Option<&[i32]>) {
        match values {
            Some(values) => {
                self.write_i32(values.len() as i32);
                for &value in values {
                    self.write_i32(value);
                }
            }
            None => self.write_i32(ABSENT),
        }
    }

    pub fn write_f32_array(&mut self, values: Option<&[f32]>) {
        match values {
            Some(values) => {
                self.write_i32(values.len() as i32);
                for &value in values {
                    self.write_f32(value);
                }
            }
            None => self.write_i32(ABSENT),
        }
    }

    pub fn write_string_array<S: AsRef<str>>(&mut self, values: Option<&[S]>) {
        match values {
            Some(values) => {
                self.write_i32(values.len() as i32);
                for value in values {
                    self.write_string(Some(value.as_ref()));
                }
            }
            None => self.write_i32(ABSENT),
        }
    }

    /// Write a binder object reference (or null).
    pub fn write_strong_binder(&mut self, binder: Option<&BinderRef>) {
        match binder {
            Some(binder) => {
                self.write_i32(OBJECT_REF);
                self.write_u32(self.objects.len() as u32);
                self.objects.push(binder.clone());
            }
            None => self.write_i32(OBJECT_NULL),
        }
    }

    /// Write the interface token header followed by `descriptor`.
    pub fn write_interface_token(&mut self, descriptor: &str) {
        self.write_i32(STRICT_MODE_HEADER);
        self.write_i32(WORK_SOURCE_UNSET);
        self.write_i32(SYSTEM_HEADER);
        self.write_string(Some(descriptor));
    }

    /// Reply header for a call that completed normally.
    pub fn write_no_exception(&mut self) {
        self.write_i32(EX_NONE);
    }

    /// Reply header for a call that raised a remote exception.
    pub fn write_exception(&mut self, code: i32, message: &str) {
        self.write_i32(code);
        self.write_string(Some(message));
        if code == EX_SERVICE_SPECIFIC {
            self.write_i32(0);
        }
    }

    fn pad_from(&mut self, start: usize) {
        let written = self.data.len() - start;
        let padded = pad4(written);
        self.data.put_bytes(0, padded - written);
    }
}

/// Round `len` up to the next multiple of four.
pub(crate) fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

impl fmt::Debug for Parcel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parcel")
            .field("len", &self.data.len())
            .field("objects", &self.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string16_is_terminated_and_padded() {
        let mut parcel = Parcel::new();
        parcel.write_string(Some("abc"));

        // len + 4 units (a, b, c, NUL) = 4 + 8 bytes
        assert_eq!(parcel.len(), 12);
        assert_eq!(&parcel.as_bytes()[0..4], &3i32.to_le_bytes());
        assert_eq!(&parcel.as_bytes()[10..12], &[0, 0]);
    }

    #[test]
    fn odd_length_string_gets_padding() {
        let mut parcel = Parcel::new();
        parcel.write_string(Some("ab"));

        // 3 units = 6 bytes, padded to 8
        assert_eq!(parcel.len(), 4 + 8);
        assert_eq!(parcel.len() % 4, 0);
    }

    #[test]
    fn absent_fields_write_minus_one() {
        let mut parcel = Parcel::new();
        parcel.write_string(None);
        parcel.write_i32_array(None);
        parcel.write_f32_array(None);
        parcel.write_string_array::<&str>(None);

        assert_eq!(parcel.len(), 16);
        for chunk in parcel.as_bytes().chunks(4) {
            assert_eq!(chunk, &ABSENT.to_le_bytes());
        }
    }

    #[test]
    fn interface_token_layout() {
        let mut parcel = Parcel::new();
        parcel.write_interface_token("a.B");

        let bytes = parcel.as_bytes();
        assert_eq!(&bytes[0..4], &STRICT_MODE_HEADER.to_le_bytes());
        assert_eq!(&bytes[4..8], &WORK_SOURCE_UNSET.to_le_bytes());
        assert_eq!(&bytes[8..12], &SYSTEM_HEADER.to_le_bytes());
        assert_eq!(&bytes[12..16], &3i32.to_le_bytes());
    }

    #[test]
    fn null_binder_takes_no_object_slot() {
        let mut parcel = Parcel::new();
        parcel.write_strong_binder(None);
        assert_eq!(parcel.object_count(), 0);
        assert_eq!(parcel.len(), 4);
    }

    #[test]
    fn pad4_rounds_up() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 4);
        assert_eq!(pad4(4), 4);
        assert_eq!(pad4(6), 8);
    }
}
