use crate::error::ResolveError;

/// Marker key for the array container token.
pub const ARRAY: &str = "array";
/// Marker key for the container open token.
pub const OPEN: &str = "<";
/// Marker key for the container close token.
pub const CLOSE: &str = ">";
/// Key for the free-form object token.
pub const OBJECT: &str = "object";

/// Maps OpenAPI type and format keys to a backend's type vocabulary.
///
/// Keys are primitive types (`integer`, `string`, ...), formats (`int64`,
/// `date-time`, ...) and the container markers [`ARRAY`], [`OPEN`] and
/// [`CLOSE`].
pub trait TypeMapper {
    fn lang_type(&self, key: &str) -> Option<&str>;

    /// Like [`TypeMapper::lang_type`] but a missing key is an error.
    fn require(&self, key: &str, location: &str) -> Result<&str, ResolveError> {
        self.lang_type(key).ok_or_else(|| ResolveError::UnmappedType {
            token: key.to_string(),
            location: location.to_string(),
        })
    }

    /// The start of an array type, e.g. `List[` or `Array<`.
    fn array_open(&self, location: &str) -> Result<String, ResolveError> {
        Ok(format!(
            "{}{}",
            self.require(ARRAY, location)?,
            self.require(OPEN, location)?
        ))
    }

    /// `depth` close tokens.
    fn closers(&self, depth: usize, location: &str) -> Result<String, ResolveError> {
        if depth == 0 {
            return Ok(String::new());
        }
        Ok(self.require(CLOSE, location)?.repeat(depth))
    }
}

/// A [`TypeMapper`] backed by a static key/token table.
#[derive(Debug, Clone, Copy)]
pub struct TypeTable {
    entries: &'static [(&'static str, &'static str)],
}

impl TypeTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(k, _)| *k)
    }
}

impl TypeMapper for TypeTable {
    fn lang_type(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}
