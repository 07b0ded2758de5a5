//! Enrolled user records

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::field::{read_optional_text, read_text, write_text};

/// Device-side access tier of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Privilege {
    /// Can record attendance
    #[default]
    Default = 0,

    /// Can enroll cards, faces and fingerprints
    Enroller = 2,

    /// Can manage device settings
    Manager = 6,

    /// Full access
    Admin = 14,
}

impl From<u8> for Privilege {
    /// Unrecognised tiers decode as [`Privilege::Default`]
    fn from(value: u8) -> Self {
        match value {
            2 => Self::Enroller,
            6 => Self::Manager,
            14 => Self::Admin,
            _ => Self::Default,
        }
    }
}

/// A user enrolled on the device
///
/// # Record layout (72 bytes)
///
/// ```text
/// offset  size  field
///      0     2  index (LE u16)
///      2     1  privilege
///      3     8  password
///     11    24  name
///     35     4  card (LE i32)
///     39     1  reserved
///     40     7  group
///     47     1  reserved
///     48    24  user id
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    /// Device-assigned slot, distinct from `user_id`
    pub index: u16,

    /// Display name (at most 24 bytes)
    pub name: String,

    /// Keypad password (at most 8 bytes)
    pub password: Option<String>,

    pub privilege: Privilege,

    /// Group label (at most 7 bytes)
    pub group: Option<String>,

    /// Externally meaningful identifier (at most 24 bytes)
    pub user_id: String,

    /// RFID card number
    pub card: i32,
}

impl User {
    /// Encoded record size
    pub const RECORD_SIZE: usize = 72;

    const PASSWORD: std::ops::Range<usize> = 3..11;
    const NAME: std::ops::Range<usize> = 11..35;
    const CARD: std::ops::Range<usize> = 35..39;
    const GROUP: std::ops::Range<usize> = 40..47;
    const USER_ID: std::ops::Range<usize> = 48..72;

    /// Create a user with default privilege and no password, group or card
    pub fn new(index: u16, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Decode one 72-byte record
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() != Self::RECORD_SIZE {
            return Err(Error::RecordSize {
                kind: "user record",
                actual: record.len(),
                expected: Self::RECORD_SIZE,
            });
        }

        Ok(Self {
            index: LittleEndian::read_u16(&record[0..2]),
            privilege: Privilege::from(record[2]),
            password: read_optional_text(&record[Self::PASSWORD]),
            name: read_text(&record[Self::NAME]),
            card: LittleEndian::read_i32(&record[Self::CARD]),
            group: read_optional_text(&record[Self::GROUP]),
            user_id: read_text(&record[Self::USER_ID]),
        })
    }

    /// Encode into a 72-byte record
    ///
    /// Fails if any text field is longer than its slot.
    pub fn encode(&self) -> Result<Bytes> {
        let mut record = [0u8; Self::RECORD_SIZE];

        LittleEndian::write_u16(&mut record[0..2], self.index);
        record[2] = self.privilege as u8;
        write_text(
            &mut record[Self::PASSWORD],
            self.password.as_deref().unwrap_or_default(),
            "password",
        )?;
        write_text(&mut record[Self::NAME], &self.name, "name")?;
        LittleEndian::write_i32(&mut record[Self::CARD], self.card);
        write_text(
            &mut record[Self::GROUP],
            self.group.as_deref().unwrap_or_default(),
            "group",
        )?;
        write_text(&mut record[Self::USER_ID], &self.user_id, "user id")?;

        Ok(Bytes::copy_from_slice(&record))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User[{}](id={}, name={}, privilege={:?})",
            self.index, self.user_id, self.name, self.privilege
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> Vec<u8> {
        let mut record = vec![0u8; 72];
        record[0..2].copy_from_slice(&12u16.to_le_bytes());
        record[2] = 14;
        record[3..7].copy_from_slice(b"4321");
        record[11..22].copy_from_slice(b"Grace Hopper");
        record[35..39].copy_from_slice(&987_654i32.to_le_bytes());
        record[40..41].copy_from_slice(b"1");
        record[48..53].copy_from_slice(b"E1042");
        record
    }

    #[test]
    fn test_decode_sample() {
        let user = User::decode(&sample_record()).unwrap();

        assert_eq!(
            user,
            User {
                index: 12,
                name: "Grace Hopper".into(),
                password: Some("4321".into()),
                privilege: Privilege::Admin,
                group: Some("1".into()),
                user_id: "E1042".into(),
                card: 987_654,
            }
        );
    }

    #[test]
    fn test_encode_matches_sample() {
        let user = User::decode(&sample_record()).unwrap();
        assert_eq!(user.encode().unwrap().as_ref(), sample_record().as_slice());
    }

    #[test]
    fn test_encode_minimal_user() {
        let record = User::new(3, "42", "Ada").encode().unwrap();

        assert_eq!(record.len(), User::RECORD_SIZE);
        assert_eq!(&record[0..3], &[3, 0, 0]);
        assert_eq!(&record[3..11], &[0; 8]);
        assert_eq!(&record[11..14], b"Ada");
        assert_eq!(&record[48..50], b"42");
    }

    #[test]
    fn test_decode_wrong_size() {
        assert!(User::decode(&[0u8; 71]).is_err());
        assert!(User::decode(&[0u8; 73]).is_err());
    }

    #[test]
    fn test_encode_rejects_long_fields() {
        let mut user = User::new(1, "1", "a name that is far too long");
        assert!(matches!(
            user.encode(),
            Err(Error::FieldTooLong { field: "name", len: 27, max: 24 })
        ));

        user.name = "ok".into();
        user.password = Some("123456789".into());
        assert!(user.encode().is_err());

        user.password = None;
        user.group = Some("eightchr".into());
        assert!(user.encode().is_err());
    }

    #[test]
    fn test_unknown_privilege_is_default() {
        assert_eq!(Privilege::from(3), Privilege::Default);
        assert_eq!(Privilege::from(6), Privilege::Manager);
    }
}
