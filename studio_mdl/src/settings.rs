use std::path::Path;

use crate::loader::is_hybrid_path;

/// On-disk layout of texture pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureEncoding {
    /// Index bytes followed by a 256 entry RGB palette.
    Indexed,
    /// 32 byte name, 256 entry RGBA palette, then remapped index bytes (`.dol` files).
    Hybrid,
}

impl TextureEncoding {
    /// Guesses the encoding from the file extension, `.dol` being hybrid.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        if is_hybrid_path(path.as_ref()) {
            Self::Hybrid
        } else {
            Self::Indexed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    decode_animations: bool,
    texture_encoding: Option<TextureEncoding>,
    strict_animation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decode_animations: true,
            texture_encoding: None,
            strict_animation: true,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, sequences keep their metadata but no blends are decoded.
    pub fn decode_animations(&mut self, decode_animations: bool) -> &mut Self {
        self.decode_animations = decode_animations;
        self
    }

    /// Overrides the encoding guessed from the file extension.
    pub fn texture_encoding(&mut self, texture_encoding: Option<TextureEncoding>) -> &mut Self {
        self.texture_encoding = texture_encoding;
        self
    }

    /// When disabled, animation streams not matching the frame count are truncated or padded
    /// instead of rejected.
    pub fn strict_animation(&mut self, strict_animation: bool) -> &mut Self {
        self.strict_animation = strict_animation;
        self
    }

    #[must_use]
    pub fn decodes_animations(&self) -> bool {
        self.decode_animations
    }

    #[must_use]
    pub fn is_strict_animation(&self) -> bool {
        self.strict_animation
    }

    /// The texture encoding to use for a model loaded from `path`.
    #[must_use]
    pub fn texture_encoding_for(&self, path: impl AsRef<Path>) -> TextureEncoding {
        self.texture_encoding
            .unwrap_or_else(|| TextureEncoding::from_path(path))
    }
}
