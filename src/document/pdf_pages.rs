use super::{LoaderConfig, PageRaster, PageWarning};
use crate::error::{Error, Result};

#[cfg(feature = "pdf")]
pub(super) fn load_pages(
    bytes: &[u8],
    config: &LoaderConfig,
) -> Result<(Vec<PageRaster>, Vec<PageWarning>)> {
    use image::DynamicImage;
    use log::debug;
    use pdfium_render::prelude::{PdfRenderConfig, Pdfium};

    use super::capped_dpi;

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::UnsupportedFormat(format!("pdfium library unavailable: {e}")))?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| Error::corrupt(0, e))?;

    let mut pages = Vec::new();
    let mut warnings = Vec::new();

    for (index, page) in document.pages().iter().enumerate() {
        let width_pt = page.width().value;
        let height_pt = page.height().value;
        if !(width_pt > 0.0 && height_pt > 0.0) {
            warnings.push(PageWarning {
                page: index,
                error: Error::corrupt(index, "page has non-positive dimensions"),
            });
            continue;
        }

        let dpi = capped_dpi(config.dpi, config.max_dimension, width_pt, height_pt);
        let scale = dpi / 72.0;
        let width = (width_pt * scale).ceil() as u32;
        let height = (height_pt * scale).ceil() as u32;
        // pdfium renders into a 4-byte-per-pixel bitmap.
        if let Err(error) = config.check_budget(index, width, height, 4) {
            warnings.push(PageWarning { page: index, error });
            continue;
        }

        let render = PdfRenderConfig::new().scale_page_by_factor(scale);
        match page.render_with_config(&render) {
            Ok(bitmap) => {
                let rgb = bitmap.as_image().to_rgb8();
                debug!("pdf page {index}: {}x{} at {dpi:.1} dpi", rgb.width(), rgb.height());
                pages.push(PageRaster::new(index, dpi, DynamicImage::ImageRgb8(rgb)));
            }
            Err(e) => warnings.push(PageWarning {
                page: index,
                error: Error::corrupt(index, e),
            }),
        }
    }

    Ok((pages, warnings))
}

#[cfg(not(feature = "pdf"))]
pub(super) fn load_pages(
    _bytes: &[u8],
    _config: &LoaderConfig,
) -> Result<(Vec<PageRaster>, Vec<PageWarning>)> {
    Err(Error::UnsupportedFormat("PDF input needs the `pdf` feature".to_string()))
}
