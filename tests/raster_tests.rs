mod fixtures;

use fixtures::TestFixtures;
use pdx_redact::{LayoutExtractor, PageRasterizer};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[test]
fn test_rasterize_page_to_png() {
    let png = PageRasterizer::with_font(None).rasterize_bytes(&TestFixtures::scenario(), 1, 72);
    assert!(png.starts_with(&PNG_SIGNATURE));

    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), 500);
    assert_eq!(decoded.height(), 500);
}

#[test]
fn test_canvas_scales_with_dpi() {
    let page = LayoutExtractor::new()
        .extract_page_bytes(&TestFixtures::scenario(), 2)
        .unwrap();
    let canvas = PageRasterizer::with_font(None).render(&page, 144).unwrap();
    assert_eq!(canvas.dimensions(), (1000, 1000));
}

#[test]
fn test_failures_yield_empty_output() {
    let rasterizer = PageRasterizer::with_font(None);
    let bytes = TestFixtures::scenario();

    assert!(rasterizer.rasterize_bytes(&bytes, 0, 72).is_empty());
    assert!(rasterizer.rasterize_bytes(&bytes, 3, 72).is_empty());
    assert!(rasterizer.rasterize_bytes(&bytes, 1, 0).is_empty());
    assert!(rasterizer.rasterize_bytes(b"not a pdf", 1, 72).is_empty());
    assert!(rasterizer.rasterize("/nonexistent/input.pdf", 1, 72).is_empty());
}

#[test]
fn test_rasterize_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixtures::write_pdf(dir.path(), "in.pdf", &TestFixtures::scenario());
    let png = PageRasterizer::with_font(None).rasterize(&path, 2, 96);
    assert!(png.starts_with(&PNG_SIGNATURE));
}
