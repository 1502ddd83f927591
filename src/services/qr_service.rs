use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::{AppError, Result};

pub const QR_SIZE: u32 = 256;
pub const QR_MARGIN: u32 = 2;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Public landing page a QR code points to.
pub fn product_url(public_base_url: &str, unique_code: &str) -> String {
    format!("{}/product/{}", public_base_url.trim_end_matches('/'), unique_code)
}

pub fn download_file_name(unique_code: &str) -> String {
    format!("QR-{}.png", unique_code)
}

/// Whole pixels per module and the pixel where the first module starts,
/// with the code centred on the canvas.
fn layout(width: u32) -> Option<(u32, u32)> {
    let modules = width + 2 * QR_MARGIN;
    let scale = QR_SIZE / modules;
    if scale == 0 {
        return None;
    }

    let offset = (QR_SIZE - scale * modules) / 2;
    Some((scale, offset + QR_MARGIN * scale))
}

/// Renders `data` as a square PNG of `QR_SIZE` pixels with a `QR_MARGIN` module quiet zone.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| AppError::InternalError(format!("Failed to encode QR code: {}", e)))?;

    let width = code.width() as u32;
    let (scale, start) = layout(width).ok_or_else(|| {
        AppError::InternalError(format!("QR code of {} modules does not fit", width))
    })?;
    let end = start + width * scale;

    let module_at = |px: u32| (start..end).contains(&px).then(|| ((px - start) / scale) as usize);

    let img = GrayImage::from_fn(QR_SIZE, QR_SIZE, |x, y| match (module_at(x), module_at(y)) {
        (Some(col), Some(row)) if code[(col, row)] == Color::Dark => DARK,
        _ => LIGHT,
    });

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::InternalError(format!("Failed to write QR image: {}", e)))?;

    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://umkm.test/product/Ab3dE5gH9k";

    #[test]
    fn url_points_at_public_product_page() {
        assert_eq!(
            product_url("https://umkm.test/", "Ab3dE5gH9k"),
            "https://umkm.test/product/Ab3dE5gH9k"
        );
        assert_eq!(download_file_name("Ab3dE5gH9k"), "QR-Ab3dE5gH9k.png");
    }

    #[test]
    fn layout_centres_whole_pixel_modules() {
        // 29 modules + 4 margin = 33, 7 px each, 231 px centred in 256
        assert_eq!(layout(29), Some((7, 12 + 14)));
        assert_eq!(layout(21), Some((10, 3 + 20)));
        assert_eq!(layout(300), None);
    }

    #[test]
    fn renders_square_png_with_quiet_zone() {
        let png = render_png(URL).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let img = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (QR_SIZE, QR_SIZE));

        for (x, y) in [(0, 0), (QR_SIZE - 1, 0), (0, QR_SIZE - 1), (QR_SIZE - 1, QR_SIZE - 1)] {
            assert_eq!(img.get_pixel(x, y)[0], 255);
        }
        assert!(img.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn finder_pattern_modules_have_equal_width() {
        let width = QrCode::with_error_correction_level(URL.as_bytes(), EcLevel::M)
            .unwrap()
            .width() as u32;
        let (scale, start) = layout(width).unwrap();

        let img = image::load_from_memory(&render_png(URL).unwrap())
            .unwrap()
            .to_luma8();

        // top row of the top-left finder: seven dark modules, then the light separator
        let y = start + scale / 2;
        assert_eq!(img.get_pixel(start - 1, y)[0], 255);
        assert!((start..start + 7 * scale).all(|x| img.get_pixel(x, y)[0] == 0));
        assert!((start + 7 * scale..start + 8 * scale).all(|x| img.get_pixel(x, y)[0] == 255));
    }
}
