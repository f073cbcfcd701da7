use crate::error::{BinderError, Result};
use crate::parcel::Parcel;
use crate::reader::ParcelReader;

pub const EX_NONE: i32 = 0;
pub const EX_SECURITY: i32 = -1;
pub const EX_BAD_PARCELABLE: i32 = -2;
pub const EX_ILLEGAL_ARGUMENT: i32 = -3;
pub const EX_NULL_POINTER: i32 = -4;
pub const EX_ILLEGAL_STATE: i32 = -5;
pub const EX_UNSUPPORTED_OPERATION: i32 = -7;
pub const EX_SERVICE_SPECIFIC: i32 = -8;
/// Reply carries a header block (size-prefixed) before the payload.
pub const EX_HAS_REPLY_HEADER: i32 = -128;

/// A two-way reply whose exception header has already been checked.
///
/// The only way to build a `Reply` is [`Reply::check`], so payload fields
/// are never decoded ahead of the remote-exception indicator.
#[derive(Debug)]
pub struct Reply {
    parcel: Parcel,
    body: usize,
}

impl Reply {
    /// Read the exception header of `parcel`; fail if the remote side threw.
    pub fn check(parcel: Parcel) -> Result<Self> {
        let body = {
            let mut reader = parcel.reader();
            read_exception(&mut reader)?;
            reader.position()
        };
        Ok(Self { parcel, body })
    }

    /// Reader positioned at the first payload field.
    pub fn reader(&self) -> ParcelReader<'_> {
        ParcelReader::at(&self.parcel, self.body)
    }
}

fn read_exception(reader: &mut ParcelReader<'_>) -> Result<()> {
    let code = reader.read_i32()?;
    match code {
        EX_NONE => Ok(()),
        EX_HAS_REPLY_HEADER => {
            let header_size = reader.read_i32()?;
            // The size includes its own four bytes.
            let skip = usize::try_from(header_size.saturating_sub(4)).unwrap_or(0);
            reader.skip(skip)?;
            Ok(())
        }
        code => {
            let message = reader
                .read_string()?
                .unwrap_or_else(|| exception_name(code).to_string());
            let message = if code == EX_SERVICE_SPECIFIC {
                let service_code = reader.read_i32().unwrap_or_default();
                format!("{message} (service code {service_code})")
            } else {
                message
            };
            Err(BinderError::RemoteException { code, message })
        }
    }
}

/// Human-readable name for a remote exception code.
pub fn exception_name(code: i32) -> &'static str {
    match code {
        EX_SECURITY => "SecurityException",
        EX_BAD_PARCELABLE => "BadParcelableException",
        EX_ILLEGAL_ARGUMENT => "IllegalArgumentException",
        EX_NULL_POINTER => "NullPointerException",
        EX_ILLEGAL_STATE => "IllegalStateException",
        EX_UNSUPPORTED_OPERATION => "UnsupportedOperationException",
        EX_SERVICE_SPECIFIC => "ServiceSpecificException",
        _ => "RemoteException",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParcelError;

    #[test]
    fn clean_reply_exposes_payload() {
        let mut parcel = Parcel::new();
        parcel.write_no_exception();
        parcel.write_i32(8);

        let reply = Reply::check(parcel).unwrap();
        assert_eq!(reply.reader().read_i32().unwrap(), 8);
    }

    #[test]
    fn remote_exception_surfaces_code_and_message() {
        let mut parcel = Parcel::new();
        parcel.write_exception(EX_SECURITY, "caller not allowed");
        parcel.write_i32(8);

        let err = Reply::check(parcel).unwrap_err();
        assert_eq!(
            err,
            BinderError::RemoteException {
                code: EX_SECURITY,
                message: "caller not allowed".to_string()
            }
        );
    }

    #[test]
    fn service_specific_exception_includes_code() {
        let mut parcel = Parcel::new();
        parcel.write_i32(EX_SERVICE_SPECIFIC);
        parcel.write_string(Some("busy"));
        parcel.write_i32(12);

        match Reply::check(parcel).unwrap_err() {
            BinderError::RemoteException { code, message } => {
                assert_eq!(code, EX_SERVICE_SPECIFIC);
                assert!(message.contains("service code 12"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reply_header_is_skipped() {
        let mut parcel = Parcel::new();
        parcel.write_i32(EX_HAS_REPLY_HEADER);
        parcel.write_i32(12);
        parcel.write_i32(0x1111);
        parcel.write_i32(0x2222);
        parcel.write_i32(21);

        let reply = Reply::check(parcel).unwrap();
        assert_eq!(reply.reader().read_i32().unwrap(), 21);
    }

    #[test]
    fn empty_reply_is_truncated() {
        let err = Reply::check(Parcel::new()).unwrap_err();
        assert!(matches!(
            err,
            BinderError::Parcel(ParcelError::Truncated { .. })
        ));
    }

    #[test]
    fn absent_message_falls_back_to_exception_name() {
        let mut parcel = Parcel::new();
        parcel.write_i32(EX_NULL_POINTER);
        parcel.write_string(None);

        match Reply::check(parcel).unwrap_err() {
            BinderError::RemoteException { message, .. } => {
                assert_eq!(message, "NullPointerException")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
