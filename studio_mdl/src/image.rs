use rgb::RGB8;

use crate::format::PALETTE_SIZE;

pub type Palette = [RGB8; PALETTE_SIZE];

/// 8-bit palettized image, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    palette: Box<Palette>,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Default for IndexedImage {
    fn default() -> Self {
        Self {
            palette: Box::new([RGB8::default(); PALETTE_SIZE]),
            pixels: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

impl IndexedImage {
    /// Returns `None` if `pixels` doesn't hold exactly `width * height` indices.
    #[must_use]
    pub fn new(palette: Box<Palette>, pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        if pixels.len() != expected {
            return None;
        }

        Some(Self {
            palette,
            pixels,
            width,
            height,
        })
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    /// Indices can be freely rewritten, the dimensions stay fixed.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Expands the indices through the palette.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<RGB8> {
        self.pixels
            .iter()
            .map(|&index| self.palette[usize::from(index)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_must_match() {
        let palette = Box::new([RGB8::default(); PALETTE_SIZE]);
        assert!(IndexedImage::new(palette.clone(), vec![0; 6], 2, 3).is_some());
        assert!(IndexedImage::new(palette.clone(), vec![0; 5], 2, 3).is_none());
        assert!(IndexedImage::new(palette, Vec::new(), 0, 7).is_some());
    }

    #[test]
    fn expands_through_palette() {
        let mut palette = Box::new([RGB8::default(); PALETTE_SIZE]);
        palette[1] = RGB8::new(255, 0, 0);
        palette[255] = RGB8::new(1, 2, 3);

        let image = IndexedImage::new(palette, vec![1, 0, 255, 1], 2, 2).unwrap();
        assert_eq!(
            image.to_rgb8(),
            [
                RGB8::new(255, 0, 0),
                RGB8::new(0, 0, 0),
                RGB8::new(1, 2, 3),
                RGB8::new(255, 0, 0)
            ]
        );
    }

    #[test]
    fn edits_show_up_in_expansion() {
        let palette = Box::new([RGB8::default(); PALETTE_SIZE]);
        let mut image = IndexedImage::new(palette, vec![0, 0, 0], 3, 1).unwrap();

        image.palette_mut()[9] = RGB8::new(40, 50, 60);
        image.pixels_mut()[1] = 9;

        assert_eq!(image.pixels(), [0, 9, 0]);
        assert_eq!(image.to_rgb8()[1], RGB8::new(40, 50, 60));
        assert_eq!(image.width(), 3);
    }
}
