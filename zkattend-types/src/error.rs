pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} is {actual} bytes, expected {expected}")]
    RecordSize {
        kind: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("{field} is {len} bytes, field holds {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{0} is not a calendar date")]
    InvalidDate(String),

    #[error("year {0} outside the device range 2000..=2132")]
    YearOutOfRange(i32),
}
