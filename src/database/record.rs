use snafu::Snafu;
use uuid::Uuid;

use super::Table;

/// A typed record id for a database record. type `T` must implement [Table] trait so that the table name can be inferred.
///
/// The identifier is the UUID part of a SurrealDB record id (`videos:⟨uuid⟩`). It is what clients see, and what is
/// bound into queries as `type::thing(<table>, $id)`.
///
/// This type implements [Default] which creates a new record with a random UUID as the identifier.
pub struct Record<T> {
    inner: Uuid,
    _marker: std::marker::PhantomData<fn() -> T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("`{text}` is not a valid {table} id"))]
pub struct ParseRecordError {
    pub table: &'static str,
    pub text: String,
}

impl<T: Table> Record<T> {
    /// Creates a new `Record` from the specified `id` and inferred the table's name from `T`.
    pub fn new(id: Uuid) -> Self {
        Record {
            inner: id,
            _marker: std::marker::PhantomData,
        }
    }

    /// Creates a new `Record` with a random UUID as the identifier.
    pub fn uuid() -> Self {
        Self::new(Uuid::new_v4())
    }

    pub fn table(&self) -> &'static str {
        T::table()
    }
}

impl<T> Record<T> {
    /// The id as bound into queries.
    pub fn key(&self) -> String {
        self.inner.to_string()
    }
}

impl<T: Table> std::str::FromStr for Record<T> {
    type Err = ParseRecordError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(input.trim())
            .map(Self::new)
            .map_err(|_| ParseRecordError {
                table: T::table(),
                text: input.to_string(),
            })
    }
}

impl<T: Table> std::default::Default for Record<T> {
    fn default() -> Self {
        Self::uuid()
    }
}

impl<T> std::fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> std::fmt::Display for Record<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> std::clone::Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> serde::Serialize for Record<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.inner)
    }
}

impl<'de, T: Table> serde::Deserialize<'de> for Record<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl<T> std::cmp::PartialEq for Record<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> std::cmp::Eq for Record<T> {}

impl<T> std::hash::Hash for Record<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clip;

    impl Table for Clip {
        fn table() -> &'static str {
            "clips"
        }
    }

    #[test]
    fn parses_hyphenated_uuid() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let record: Record<Clip> = id.parse().unwrap();
        assert_eq!(record.key(), id);
        assert_eq!(record.table(), "clips");
    }

    #[test]
    fn rejects_non_uuid_ids() {
        for input in ["65a1f0c2e4b0a1b2c3d4e5f6", "", "clips:abc", "../etc/passwd"] {
            let err = input.parse::<Record<Clip>>().unwrap_err();
            assert_eq!(err.table, "clips");
            assert_eq!(err.text, input);
        }
    }

    #[test]
    fn round_trips_through_json_as_a_plain_string() {
        let record = Record::<Clip>::uuid();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::Value::String(record.key()));

        let back: Record<Clip> = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
