pub mod image_helper {
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, ImageError, RgbImage};
    use std::io::{BufWriter, Write};
    use std::path::Path;

    /// Encodes an RGB image as PNG at `path`, replacing any existing file.
    /// The buffered bytes are flushed before returning, so a full or failing
    /// disk surfaces here. A regular file that fails mid-write is removed again.
    pub fn save_png(path: &Path, image: &RgbImage) -> Result<(), ImageError> {
        let output = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(output);

        let written = PngEncoder::new(&mut writer)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .and_then(|()| writer.flush().map_err(ImageError::IoError));
        if written.is_err() && path.is_file() {
            let _ = std::fs::remove_file(path);
        }
        written
    }

    /// Decodes any supported image at `path` and flattens it to 8-bit RGB.
    pub fn load_rgb(path: &Path) -> Result<RgbImage, ImageError> {
        Ok(image::open(path)?.to_rgb8())
    }
}
