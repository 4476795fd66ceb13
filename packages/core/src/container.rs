//! Byte-bearing containers.
//!
//! A [`BinaryContainer`] is an immutable, ordered list of parts (text, raw
//! bytes, or other containers) with an eagerly computed size and a type tag.
//! A [`NamedBinaryContainer`] adds a name and a modification timestamp.

use std::ops::Deref;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::codec;
use crate::ShimError;

/// One part of a container.
#[derive(Debug, Clone)]
pub enum Part {
    /// Text, contributing its UTF-8 encoding.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A nested container, contributing its own parts.
    Container(BinaryContainer),
}

impl Part {
    /// Number of bytes this part contributes.
    pub fn size(&self) -> usize {
        match self {
            // A `str` is valid UTF-8, so its length is its encoded size.
            Part::Text(text) => text.len(),
            Part::Bytes(bytes) => bytes.len(),
            Part::Container(container) => container.size(),
        }
    }
}

impl From<&str> for Part {
    fn from(v: &str) -> Self {
        Part::Text(v.to_string())
    }
}

impl From<String> for Part {
    fn from(v: String) -> Self {
        Part::Text(v)
    }
}

impl From<Bytes> for Part {
    fn from(v: Bytes) -> Self {
        Part::Bytes(v)
    }
}

impl From<Vec<u8>> for Part {
    fn from(v: Vec<u8>) -> Self {
        Part::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for Part {
    fn from(v: &[u8]) -> Self {
        Part::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<BinaryContainer> for Part {
    fn from(v: BinaryContainer) -> Self {
        Part::Container(v)
    }
}

impl From<NamedBinaryContainer> for Part {
    fn from(v: NamedBinaryContainer) -> Self {
        Part::Container(v.inner)
    }
}

/// An immutable sequence of byte-bearing parts.
///
/// # Example
///
/// ```rust
/// use hostshim_core::{BinaryContainer, Part};
///
/// let container = BinaryContainer::with_type(
///     vec![Part::from("ab"), Part::from(vec![1u8, 2, 3])],
///     "application/octet-stream",
/// ).unwrap();
///
/// assert_eq!(container.size(), 5);
/// assert_eq!(container.content_type(), "application/octet-stream");
/// ```
#[derive(Debug, Clone)]
pub struct BinaryContainer {
    parts: Arc<[Part]>,
    size: usize,
    content_type: String,
}

impl BinaryContainer {
    /// Create a container with an empty type tag.
    pub fn new(parts: impl IntoIterator<Item = Part>) -> Self {
        let parts: Arc<[Part]> = parts.into_iter().collect();
        let size = parts.iter().map(Part::size).sum();
        Self {
            parts,
            size,
            content_type: String::new(),
        }
    }

    /// Create a container with a type tag.
    ///
    /// # Errors
    ///
    /// Fails with a validation error when the type contains characters
    /// outside printable ASCII. The stored type is lowercased.
    pub fn with_type(
        parts: impl IntoIterator<Item = Part>,
        content_type: &str,
    ) -> Result<Self, ShimError> {
        let content_type = normalize_type(content_type)?;
        Ok(Self {
            content_type,
            ..Self::new(parts)
        })
    }

    /// Total size in bytes, fixed at construction.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Concatenate every part into a single buffer.
    ///
    /// Parts are visited in order; nested containers are flattened in place.
    pub async fn materialize(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.size);
        self.copy_into(&mut out);
        out.freeze()
    }

    /// Materialize and decode the contents as UTF-8.
    pub async fn text(&self) -> String {
        codec::decode_utf8(&self.materialize().await)
    }

    fn copy_into(&self, out: &mut BytesMut) {
        for part in self.parts.iter() {
            match part {
                Part::Text(text) => out.extend_from_slice(&codec::encode_utf8(text)),
                Part::Bytes(bytes) => out.extend_from_slice(bytes),
                Part::Container(container) => container.copy_into(out),
            }
        }
    }

    /// Derive a container for a byte range.
    ///
    /// Known limitation: the range is not applied. The result shares every
    /// part of `self` (and so has the same size); only the type tag may
    /// differ.
    pub fn slice(
        &self,
        _start: usize,
        _end: usize,
        content_type: Option<&str>,
    ) -> Result<BinaryContainer, ShimError> {
        let content_type = match content_type {
            Some(t) => normalize_type(t)?,
            None => self.content_type.clone(),
        };
        Ok(Self {
            parts: Arc::clone(&self.parts),
            size: self.size,
            content_type,
        })
    }
}

fn normalize_type(content_type: &str) -> Result<String, ShimError> {
    if content_type.chars().any(|c| !(' '..='~').contains(&c)) {
        return Err(ShimError::validation(format!(
            "invalid content type: {:?}",
            content_type
        )));
    }
    Ok(content_type.to_ascii_lowercase())
}

/// Options for [`NamedBinaryContainer::new`].
#[derive(Debug, Clone, Default)]
pub struct NamedOptions {
    /// Type tag; empty when unset.
    pub content_type: Option<String>,
    /// Milliseconds since the Unix epoch; the current time when unset.
    pub last_modified: Option<i64>,
}

impl NamedOptions {
    pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_last_modified(mut self, millis: i64) -> Self {
        self.last_modified = Some(millis);
        self
    }
}

/// A container with a name and a modification time.
///
/// Dereferences to the underlying [`BinaryContainer`].
#[derive(Debug, Clone)]
pub struct NamedBinaryContainer {
    inner: BinaryContainer,
    name: String,
    last_modified: i64,
}

impl NamedBinaryContainer {
    /// Create a named container.
    ///
    /// # Errors
    ///
    /// Fails when the underlying container cannot be built.
    pub fn new(
        parts: impl IntoIterator<Item = Part>,
        name: impl Into<String>,
        options: NamedOptions,
    ) -> Result<Self, ShimError> {
        let inner = match options.content_type.as_deref() {
            Some(t) => BinaryContainer::with_type(parts, t)?,
            None => BinaryContainer::new(parts),
        };
        Ok(Self {
            inner,
            name: name.into(),
            last_modified: options
                .last_modified
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn container(&self) -> &BinaryContainer {
        &self.inner
    }
}

impl Deref for NamedBinaryContainer {
    type Target = BinaryContainer;

    fn deref(&self) -> &BinaryContainer {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn size_sums_encoded_parts() {
        let container = BinaryContainer::new(vec![Part::from("ab"), Part::from(vec![1u8, 2, 3])]);
        assert_eq!(container.size(), 5);
    }

    #[test]
    fn text_parts_count_utf8_bytes() {
        let container = BinaryContainer::new(vec![Part::from("é😀")]);
        assert_eq!(container.size(), 6);
    }

    #[test]
    fn nested_sizes_add_up() {
        let inner = BinaryContainer::new(vec![Part::from("abc")]);
        let outer = BinaryContainer::new(vec![Part::from(inner), Part::from(&b"de"[..])]);
        assert_eq!(outer.size(), 5);
    }

    #[tokio::test]
    async fn materialize_concatenates_in_order() {
        let inner = BinaryContainer::new(vec![Part::from("cd")]);
        let container = BinaryContainer::new(vec![
            Part::from("ab"),
            Part::from(inner),
            Part::from(vec![0x65u8]),
        ]);

        let bytes = container.materialize().await;
        assert_eq!(bytes.as_ref(), b"abcde");
        assert_eq!(bytes.len(), container.size());
        assert_eq!(container.text().await, "abcde");
    }

    #[test]
    fn type_is_lowercased() {
        let container = BinaryContainer::with_type(Vec::new(), "Text/Plain").unwrap();
        assert_eq!(container.content_type(), "text/plain");
        assert_eq!(container.size(), 0);
    }

    #[test]
    fn non_printable_type_is_rejected() {
        let err = BinaryContainer::with_type(Vec::new(), "text/\u{7f}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn slice_reuses_whole_parts() {
        let container = BinaryContainer::with_type(vec![Part::from("hello")], "text/plain").unwrap();
        let slice = container.slice(1, 3, None).unwrap();

        assert_eq!(slice.size(), 5);
        assert_eq!(slice.content_type(), "text/plain");
        assert_eq!(slice.text().await, "hello");

        let retyped = container.slice(0, 5, Some("application/json")).unwrap();
        assert_eq!(retyped.content_type(), "application/json");
    }

    #[tokio::test]
    async fn named_container_wraps_container() {
        let file = NamedBinaryContainer::new(
            vec![Part::from("data")],
            "notes.txt",
            NamedOptions::default().with_last_modified(42),
        )
        .unwrap();

        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.last_modified(), 42);
        assert_eq!(file.size(), 4);
        assert_eq!(file.materialize().await.as_ref(), b"data");
    }

    #[test]
    fn named_container_defaults_to_now() {
        let before = chrono::Utc::now().timestamp_millis();
        let file = NamedBinaryContainer::new(Vec::new(), "empty", NamedOptions::default()).unwrap();
        assert!(file.last_modified() >= before);
        assert_eq!(file.content_type(), "");
    }

    #[test]
    fn named_container_fails_with_bad_type() {
        let result = NamedBinaryContainer::new(
            Vec::new(),
            "x",
            NamedOptions::default().with_type("bad\ttype"),
        );
        assert!(result.is_err());
    }
}
