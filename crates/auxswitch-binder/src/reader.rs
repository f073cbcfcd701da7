use crate::binder::BinderRef;
use crate::error::ParcelError;
use crate::parcel::{pad4, Parcel, ABSENT, OBJECT_NULL, OBJECT_REF, SYSTEM_HEADER};

/// Upper bound on array lengths accepted from a remote peer.
const MAX_ARRAY_LEN: i32 = 64 * 1024;

type Result<T> = std::result::Result<T, ParcelError>;

/// Sequential reader over a [`Parcel`].
///
/// Every read either consumes exactly the bytes of one field or fails
/// without panicking; a truncated or malformed parcel never aborts the caller.
pub struct ParcelReader<'a> {
    parcel: &'a Parcel,
    pos: usize,
}

impl<'a> ParcelReader<'a> {
    pub(crate) fn new(parcel: &'a Parcel) -> Self {
        Self { parcel, pos: 0 }
    }

    pub(crate) fn at(parcel: &'a Parcel, pos: usize) -> Self {
        Self { parcel, pos }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.parcel.len().saturating_sub(self.pos)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let raw = self.take(4)?;
        Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_i32().map(|v| v as u32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_u32().map(f32::from_bits)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_i32().map(|v| v != 0)
    }

    /// Read a string16; `None` when the sender wrote the absent marker.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        let len = self.read_i32()?;
        if len == ABSENT {
            return Ok(None);
        }
        if len < 0 {
            return Err(ParcelError::InvalidLength(len));
        }

        let units = len as usize + 1;
        let raw = self.take(pad4(units * 2))?;
        let mut decoded = Vec::with_capacity(units);
        for pair in raw[..units * 2].chunks_exact(2) {
            decoded.push(u16::from_le_bytes([pair[0], pair[1]]));
        }

        if decoded.pop() != Some(0) {
            return Err(ParcelError::InvalidString);
        }
        String::from_utf16(&decoded)
            .map(Some)
            .map_err(|_| ParcelError::InvalidString)
    }

    pub fn read_i32_array(&mut self) -> Result<Option<Vec<i32>>> {
        let Some(len) = self.read_array_len()? else {
            return Ok(None);
        };
        (0..len).map(|_| self.read_i32()).collect::<Result<_>>().map(Some)
    }

    pub fn read_f32_array(&mut self) -> Result<Option<Vec<f32>>> {
        let Some(len) = self.read_array_len()? else {
            return Ok(None);
        };
        (0..len).map(|_| self.read_f32()).collect::<Result<_>>().map(Some)
    }

    /// Read a string array. Absent elements are kept as `None`.
    pub fn read_string_array(&mut self) -> Result<Option<Vec<Option<String>>>> {
        let Some(len) = self.read_array_len()? else {
            return Ok(None);
        };
        (0..len)
            .map(|_| self.read_string())
            .collect::<Result<_>>()
            .map(Some)
    }

    /// Read a binder object reference from the parcel's object table.
    pub fn read_strong_binder(&mut self) -> Result<Option<BinderRef>> {
        match self.read_i32()? {
            OBJECT_NULL => Ok(None),
            OBJECT_REF => {
                let index = self.read_u32()?;
                self.parcel
                    .object(index)
                    .cloned()
                    .map(Some)
                    .ok_or(ParcelError::MissingObject(index))
            }
            other => Err(ParcelError::InvalidLength(other)),
        }
    }

    /// Validate the interface token written by `write_interface_token`.
    pub fn enforce_interface(&mut self, expected: &str) -> Result<()> {
        let _strict_mode = self.read_i32()?;
        let _work_source = self.read_i32()?;
        let header = self.read_i32()?;
        let actual = self.read_string()?.unwrap_or_default();

        if header != SYSTEM_HEADER || actual != expected {
            return Err(ParcelError::InterfaceMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_array_len(&mut self) -> Result<Option<usize>> {
        let len = self.read_i32()?;
        if len == ABSENT {
            return Ok(None);
        }
        if !(0..=MAX_ARRAY_LEN).contains(&len) {
            return Err(ParcelError::InvalidLength(len));
        }
        Ok(Some(len as usize))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(ParcelError::Truncated {
                needed: len,
                remaining,
            });
        }
        let bytes: &'a [u8] = self.parcel.as_bytes();
        let slice = &bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_write_order() {
        let mut parcel = Parcel::new();
        parcel.write_i32(47);
        parcel.write_i32_array(Some(&[1, 5]));
        parcel.write_f32_array(None);
        parcel.write_string_array(Some(&["x", "yz"]));
        parcel.write_string(Some("line"));

        let mut reader = parcel.reader();
        assert_eq!(reader.read_i32().unwrap(), 47);
        assert_eq!(reader.read_i32_array().unwrap(), Some(vec![1, 5]));
        assert_eq!(reader.read_f32_array().unwrap(), None);
        assert_eq!(
            reader.read_string_array().unwrap(),
            Some(vec![Some("x".to_string()), Some("yz".to_string())])
        );
        assert_eq!(reader.read_string().unwrap().as_deref(), Some("line"));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncated_int_is_an_error() {
        let parcel = Parcel::from_bytes(&[1, 0]);
        let err = parcel.reader().read_i32().unwrap_err();
        assert_eq!(
            err,
            ParcelError::Truncated {
                needed: 4,
                remaining: 2
            }
        );
    }

    #[test]
    fn negative_string_length_rejected() {
        let mut parcel = Parcel::new();
        parcel.write_i32(-7);
        assert_eq!(
            parcel.reader().read_string(),
            Err(ParcelError::InvalidLength(-7))
        );
    }

    #[test]
    fn oversized_array_rejected() {
        let mut parcel = Parcel::new();
        parcel.write_i32(MAX_ARRAY_LEN + 1);
        assert!(matches!(
            parcel.reader().read_i32_array(),
            Err(ParcelError::InvalidLength(_))
        ));
    }

    #[test]
    fn missing_terminator_rejected() {
        let mut parcel = Parcel::new();
        parcel.write_i32(1);
        parcel.write_u32(0x0041_0041); // "A" followed by "A" instead of NUL
        assert_eq!(
            parcel.reader().read_string(),
            Err(ParcelError::InvalidString)
        );
    }

    #[test]
    fn enforce_interface_accepts_matching_token() {
        let mut parcel = Parcel::new();
        parcel.write_interface_token("com.syu.ipc.IRemoteModule");
        parcel.write_i32(3);

        let mut reader = parcel.reader();
        reader
            .enforce_interface("com.syu.ipc.IRemoteModule")
            .unwrap();
        assert_eq!(reader.read_i32().unwrap(), 3);
    }

    #[test]
    fn enforce_interface_rejects_other_token() {
        let mut parcel = Parcel::new();
        parcel.write_interface_token("a.Other");

        let err = parcel.reader().enforce_interface("a.Expected").unwrap_err();
        assert!(matches!(err, ParcelError::InterfaceMismatch { .. }));
    }

    #[test]
    fn dangling_object_index_rejected() {
        let mut parcel = Parcel::new();
        parcel.write_i32(OBJECT_REF);
        parcel.write_u32(4);
        assert!(matches!(
            parcel.reader().read_strong_binder(),
            Err(ParcelError::MissingObject(4))
        ));
    }

    #[test]
    fn non_ascii_string_survives() {
        let mut parcel = Parcel::new();
        parcel.write_string(Some("línea"));
        assert_eq!(
            parcel.reader().read_string().unwrap().as_deref(),
            Some("línea")
        );
    }
}
