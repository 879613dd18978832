use std::io::Cursor;

use ::tiff::ColorType;
use ::tiff::decoder::{Decoder, DecodingResult, Limits};
use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use log::debug;

use super::{LoaderConfig, PageRaster, PageWarning};
use crate::error::{Error, Result};

/// Decode every image file directory of a TIFF as its own page.
pub(super) fn load_pages(
    bytes: &[u8],
    config: &LoaderConfig,
) -> Result<(Vec<PageRaster>, Vec<PageWarning>)> {
    // The memory ceiling is enforced per page below.
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| Error::corrupt(0, e))?
        .with_limits(Limits::unlimited());

    let mut pages = Vec::new();
    let mut warnings = Vec::new();
    let mut page = 0usize;

    loop {
        match decode_page(&mut decoder, page, config) {
            Ok(image) => {
                debug!("tiff page {page}: {}x{}", image.width(), image.height());
                pages.push(PageRaster::new(page, config.image_dpi, image));
            }
            Err(error) => warnings.push(PageWarning { page, error }),
        }

        if !decoder.more_images() {
            break;
        }
        page += 1;
        if let Err(e) = decoder.next_image() {
            // The directory chain is broken; nothing after this page is reachable.
            warnings.push(PageWarning {
                page,
                error: Error::corrupt(page, e),
            });
            break;
        }
    }

    Ok((pages, warnings))
}

fn decode_page(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    page: usize,
    config: &LoaderConfig,
) -> Result<DynamicImage> {
    let (width, height) = decoder.dimensions().map_err(|e| Error::corrupt(page, e))?;
    let color = decoder.colortype().map_err(|e| Error::corrupt(page, e))?;

    let (channels, bits) = match color {
        ColorType::Gray(b) => (1u64, b),
        ColorType::GrayA(b) => (2, b),
        ColorType::RGB(b) => (3, b),
        ColorType::RGBA(b) => (4, b),
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "page {page}: TIFF color type {other:?}"
            )));
        }
    };
    config.check_budget(page, width, height, channels * (bits as u64).div_ceil(8))?;

    let data = decoder.read_image().map_err(|e| Error::corrupt(page, e))?;
    let image = match (color, data) {
        (ColorType::Gray(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::GrayA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
        }
        (ColorType::RGB(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        (ColorType::Gray(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf).map(DynamicImage::ImageLuma16)
        }
        (ColorType::RGB(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgb16)
        }
        (ColorType::RGBA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgba16)
        }
        (other, _) => {
            return Err(Error::UnsupportedFormat(format!(
                "page {page}: TIFF sample layout {other:?}"
            )));
        }
    };

    image.ok_or_else(|| Error::corrupt(page, "pixel buffer does not match page dimensions"))
}
