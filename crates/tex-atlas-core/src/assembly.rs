use crate::error::{AtlasError, Result};
use image::{DynamicImage, RgbaImage};

/// Anything that can be packed: the packer only needs its size.
pub trait SourceImage {
    fn dimensions(&self) -> (u32, u32);
}

impl SourceImage for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

impl SourceImage for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

/// Size-only source for layout runs.
impl SourceImage for (u32, u32) {
    fn dimensions(&self) -> (u32, u32) {
        *self
    }
}

impl<S: SourceImage + ?Sized> SourceImage for &S {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }
}

/// Named input set, kept in insertion order so id assignment is reproducible.
///
/// Duplicate names are handled per entry point: [`insert`](Self::insert) and
/// [`with`](Self::with) reject them with `DuplicateName`, while collecting
/// from an iterator cannot fail and keeps the last value for a name at the
/// position where the name first appeared (like collecting into a map).
/// Use [`try_from_entries`](Self::try_from_entries) for a rejecting bulk build.
#[derive(Debug, Clone)]
pub struct TextureAssembly<S> {
    entries: Vec<(String, S)>,
}

impl<S> Default for TextureAssembly<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> TextureAssembly<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `source` under `name`. Names must be unique.
    pub fn insert<K: Into<String>>(&mut self, name: K, source: S) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(AtlasError::DuplicateName(name));
        }
        self.entries.push((name, source));
        Ok(())
    }

    /// Builds an assembly from `entries`, failing on the first duplicate name.
    pub fn try_from_entries<K, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, S)>,
    {
        let mut out = Self::new();
        for (k, s) in entries {
            out.insert(k, s)?;
        }
        Ok(out)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<K: Into<String>>(mut self, name: K, source: S) -> Result<Self> {
        self.insert(name, source)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Source at insertion index `index` (equal to its registry id).
    pub fn get_index(&self, index: usize) -> Option<(&str, &S)> {
        self.entries.get(index).map(|(n, s)| (n.as_str(), s))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, S> FromIterator<(K, S)> for TextureAssembly<S> {
    /// Later duplicates replace earlier entries in place.
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, s) in iter {
            let name = k.into();
            match out.entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = s,
                None => out.entries.push((name, s)),
            }
        }
        out
    }
}
