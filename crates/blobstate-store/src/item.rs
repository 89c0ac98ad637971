use bytes::Bytes;

/// One stored resource: a name, a media type and an opaque payload.
///
/// `Item` is immutable. The payload is held as [`Bytes`], so clones handed
/// out by a store share the buffer without letting callers mutate it.
/// No validation happens here; the HTTP layer checks names and media types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl Item {
    /// Create an item from its parts.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Read-only view of the payload. Cloning the returned `Bytes` is cheap.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `other` carries the same media type and payload.
    ///
    /// Names are not compared.
    pub fn same_content(&self, other: &Item) -> bool {
        self.mime_type == other.mime_type && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_parts() {
        let item = Item::new("foo", "bar", b"fasel".to_vec());
        assert_eq!(item.name(), "foo");
        assert_eq!(item.mime_type(), "bar");
        assert_eq!(item.data().as_ref(), b"fasel");
        assert_eq!(item.len(), 5);
    }

    #[test]
    fn empty_payload_is_allowed() {
        let item = Item::new("qwertyASDFGH", "text/html; charset=utf-8", Bytes::new());
        assert!(item.is_empty());
    }

    #[test]
    fn unicode_names_are_kept_verbatim() {
        let item = Item::new("Som!_🎵nam3", "any kind of string", vec![1u8, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(item.name(), "Som!_🎵nam3");
        assert_eq!(item.len(), 8);
    }

    #[test]
    fn same_content_ignores_name() {
        let a = Item::new("a", "text/plain", "body");
        let b = Item::new("b", "text/plain", "body");
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn same_content_detects_changes() {
        let base = Item::new("a", "text/plain", "body");
        assert!(!base.same_content(&Item::new("a", "text/html", "body")));
        assert!(!base.same_content(&Item::new("a", "text/plain", "other")));
    }

    #[test]
    fn clones_share_payload() {
        let item = Item::new("shared", "application/octet-stream", vec![0u8; 64]);
        let copy = item.clone();
        assert_eq!(item.data().as_ptr(), copy.data().as_ptr());
    }
}
