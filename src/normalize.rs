use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::error::{LimitError, LimitErrorKind};
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, imageops, imageops::FilterType};
use palette::Srgb;

use crate::error::Error;

/// Side length of the square every image is resized to before estimation.
pub const DEFAULT_SIZE: u32 = 150;

/// Where the raster bytes come from.
#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        ImageSource::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for ImageSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        ImageSource::Path(path.as_path())
    }
}

impl<'a> From<&'a [u8]> for ImageSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ImageSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ImageSource::Bytes(bytes.as_slice())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeOptions {
    /// Output is `size × size` pixels.
    pub size: u32,
    pub filter: FilterType,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            filter: FilterType::Triangle,
        }
    }
}

/// Flat, row-major RGB pixels of a normalized image.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelMatrix {
    width: u32,
    height: u32,
    pixels: Vec<Srgb<u8>>,
}

impl PixelMatrix {
    /// Wrap already-normalized pixels. `pixels.len()` must equal
    /// `width * height` and the matrix must not be empty.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Srgb<u8>>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter(format!(
                "pixel matrix must not be empty ({width}x{height})"
            )));
        }
        if pixels.len() != width as usize * height as usize {
            return Err(Error::InvalidParameter(format!(
                "{} pixels do not fill a {width}x{height} matrix",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Srgb<u8>] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Decode a raster image, guessing the format from its content.
pub fn decode(source: ImageSource<'_>) -> Result<DynamicImage, Error> {
    let img = match source {
        ImageSource::Path(path) => ImageReader::open(path)?.with_guessed_format()?.decode()?,
        ImageSource::Bytes(bytes) => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?,
    };
    Ok(img)
}

/// Decode `source` and normalize it into a [`PixelMatrix`].
pub fn load(source: ImageSource<'_>, opts: &NormalizeOptions) -> Result<PixelMatrix, Error> {
    check_size(opts)?;
    let img = decode(source)?;
    from_image(&img, opts)
}

/// Force RGB8 (alpha dropped, gray and indexed images expanded) and resize
/// to `opts.size × opts.size`.
pub fn from_image(img: &DynamicImage, opts: &NormalizeOptions) -> Result<PixelMatrix, Error> {
    check_size(opts)?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(Error::Decode(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::DimensionError,
        ))));
    }

    let rgb = img.to_rgb8();
    let resized = imageops::resize(&rgb, opts.size, opts.size, opts.filter);
    log::debug!(
        "normalized {w}x{h} image to {}x{} with {:?}",
        opts.size,
        opts.size,
        opts.filter
    );

    let pixels = resized
        .pixels()
        .map(|p| Srgb::new(p[0], p[1], p[2]))
        .collect();
    PixelMatrix::from_pixels(opts.size, opts.size, pixels)
}

fn check_size(opts: &NormalizeOptions) -> Result<(), Error> {
    if opts.size == 0 {
        return Err(Error::InvalidParameter(
            "normalization size must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn resizes_to_fixed_square() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 20, Rgb([9, 8, 7])));
        let matrix = from_image(&img, &NormalizeOptions::default()).unwrap();
        assert_eq!((matrix.width(), matrix.height()), (150, 150));
        assert_eq!(matrix.len(), 22_500);
        assert!(matrix.pixels().iter().all(|&p| p == Srgb::new(9, 8, 7)));
    }

    #[test]
    fn expands_grayscale() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([200])));
        let opts = NormalizeOptions { size: 2, ..Default::default() };
        let matrix = from_image(&img, &opts).unwrap();
        assert!(matrix.pixels().iter().all(|&p| p == Srgb::new(200, 200, 200)));
    }

    #[test]
    fn drops_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 0])));
        let opts = NormalizeOptions { size: 3, filter: FilterType::Nearest };
        let matrix = from_image(&img, &opts).unwrap();
        assert!(matrix.pixels().iter().all(|&p| p == Srgb::new(10, 20, 30)));
    }

    #[test]
    fn deterministic_resize() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(37, 53, |x, y| {
            Rgb([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8])
        }));
        let opts = NormalizeOptions::default();
        assert_eq!(from_image(&img, &opts).unwrap(), from_image(&img, &opts).unwrap());
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = load(ImageSource::Bytes(b"definitely not an image"), &NormalizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn rejects_missing_file() {
        let path = Path::new("/nonexistent/dir/picture.png");
        let err = load(path.into(), &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn rejects_zero_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let opts = NormalizeOptions { size: 0, ..Default::default() };
        assert!(matches!(from_image(&img, &opts), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn matrix_length_must_match_dimensions() {
        let px = vec![Srgb::new(0u8, 0, 0); 3];
        assert!(PixelMatrix::from_pixels(2, 2, px).is_err());
        assert!(PixelMatrix::from_pixels(0, 0, Vec::new()).is_err());
    }
}
