// ============================================================================
// IMAGE I/O: decode into the engine, encode out of it
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageError, ImageFormat, RgbaImage};

use canvas_engine::{CanvasEngine, EngineConfig};

/// Output formats the headless host can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    /// Match a format name or file extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "webp" => Some(SaveFormat::Webp),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tif" | "tiff" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }
}

/// Decode any supported image file to straight RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("could not decode '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

/// Decode `path` and hand its pixels to a fresh engine.
pub fn load_into_engine(path: &Path, config: EngineConfig) -> Result<CanvasEngine> {
    let img = load_image(path)?;
    let (w, h) = img.dimensions();
    CanvasEngine::from_raw(img.into_raw(), w, h, config)
        .with_context(|| format!("'{}' produced an invalid raster", path.display()))
}

/// Copy the engine's raster out as an `RgbaImage`.
pub fn engine_to_image(engine: &CanvasEngine) -> Result<RgbaImage> {
    RgbaImage::from_raw(engine.width(), engine.height(), engine.export())
        .context("canvas raster does not match its dimensions")
}

/// Encode `image` to `path` as `format`. `quality` only affects JPEG.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    let (w, h) = image.dimensions();

    match format {
        SaveFormat::Png => {
            let mut writer = create(path)?;
            PngEncoder::new(&mut writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut writer = create(path)?;
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)).encode(
                rgb.as_raw(),
                w,
                h,
                ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            DynamicImage::ImageRgba8(image.clone()).save_with_format(path, ImageFormat::WebP)?;
        }
        SaveFormat::Bmp => {
            let mut writer = create(path)?;
            BmpEncoder::new(&mut writer).encode(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Tga => {
            let mut writer = create(path)?;
            TgaEncoder::new(&mut writer).encode(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Tiff => {
            let mut writer = create(path)?;
            TiffEncoder::new(&mut writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
    }

    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, ImageError> {
    Ok(BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("canvas-engine-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn format_names_and_extensions() {
        assert_eq!(SaveFormat::from_name("JPEG"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_name("tif"), Some(SaveFormat::Tiff));
        assert_eq!(SaveFormat::from_name("gif"), None);
        assert_eq!(SaveFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let mut engine = CanvasEngine::new(5, 3);
        let pixels: Vec<u8> = (0..60u8).map(|v| v.wrapping_mul(13)).collect();
        engine.load(&pixels, 5, 3).unwrap();

        let path = scratch("round_trip.png");
        encode_and_write(&engine_to_image(&engine).unwrap(), &path, SaveFormat::Png, 90).unwrap();

        let back = load_into_engine(&path, EngineConfig::default()).unwrap();
        assert_eq!((back.width(), back.height()), (5, 3));
        assert_eq!(back.export(), pixels);
        assert!(!back.can_undo());
    }

    #[test]
    fn jpeg_drops_alpha() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 40]));
        let path = scratch("flat.jpg");
        encode_and_write(&img, &path, SaveFormat::Jpeg, 95).unwrap();
        let back = load_image(&path).unwrap();
        assert!(back.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_image(Path::new("/no/such/image.png")).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/image.png"));
    }
}
