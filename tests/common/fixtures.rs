use countfire::PageRaster;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect as PixelRect;
use tempfile::NamedTempFile;
use tiff::encoder::{TiffEncoder, colortype};

pub const PAPER: Luma<u8> = Luma([255u8]);
pub const INK: Luma<u8> = Luma([0u8]);

/// A white page of the given size.
pub fn blank_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, PAPER)
}

/// Draws a filled black disc.
pub fn draw_disc(img: &mut GrayImage, cx: i32, cy: i32, radius: i32) {
    draw_filled_circle_mut(img, (cx, cy), radius, INK);
}

/// Draws a filled black axis-aligned box.
pub fn draw_box(img: &mut GrayImage, x: i32, y: i32, width: u32, height: u32) {
    draw_filled_rect_mut(img, PixelRect::at(x, y).of_size(width, height), INK);
}

/// Wraps a grayscale image as page `index`.
pub fn raster(index: usize, img: GrayImage) -> PageRaster {
    PageRaster::new(index, 72.0, DynamicImage::ImageLuma8(img))
}

/// A 200x200 page with a single disc of about 500 px² centred at (100, 100).
pub fn single_disc_page() -> PageRaster {
    let mut img = blank_page(200, 200);
    draw_disc(&mut img, 100, 100, 12);
    raster(0, img)
}

/// Saves an image as PNG into a temp file that is removed on drop.
pub fn write_png(img: &GrayImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Writes every image as one page of a grayscale TIFF.
pub fn write_multipage_tiff(pages: &[GrayImage]) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".tif")
        .tempfile()
        .expect("Failed to create temp tiff file");
    let handle = file.reopen().expect("Failed to open temp tiff file");
    let mut encoder = TiffEncoder::new(handle).expect("Failed to create tiff encoder");
    for page in pages {
        encoder
            .write_image::<colortype::Gray8>(page.width(), page.height(), page.as_raw())
            .expect("Failed to write tiff page");
    }
    file
}
