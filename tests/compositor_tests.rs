mod fixtures;

use std::fs;

use fixtures::{contents_entry, overlay_rects, page_content, TestFixtures};
use pdx_redact::{
    BoundingBox, Error, LayoutExtractor, ManualRegion, RedactionCompositor, RedactionRegion, RegionOrigin,
};

fn located(page: u32, bbox: BoundingBox) -> RedactionRegion {
    RedactionRegion {
        page,
        bbox: Some(bbox),
        origin: RegionOrigin::Located,
    }
}

#[test]
fn test_scenario_overlay_is_bottom_up() {
    let output = RedactionCompositor::new()
        .compose_bytes(
            &TestFixtures::scenario(),
            &[located(1, BoundingBox::new(10.0, 10.0, 40.0, 20.0))],
        )
        .unwrap();

    assert_eq!(overlay_rects(&output, 1), vec![[10.0, 490.0, 40.0, 20.0]]);
}

#[test]
fn test_pages_without_regions_pass_through() {
    let input = TestFixtures::scenario();
    let output = RedactionCompositor::new()
        .compose_bytes(&input, &[located(1, BoundingBox::new(10.0, 10.0, 40.0, 20.0))])
        .unwrap();

    assert_eq!(contents_entry(&output, 2), contents_entry(&input, 2));
    assert_eq!(page_content(&output, 2), page_content(&input, 2));
}

#[test]
fn test_overlaps_paint_independently() {
    let bbox = BoundingBox::new(100.0, 200.0, 50.0, 20.0);
    let manual = ManualRegion::new(1, bbox);
    let output = RedactionCompositor::new()
        .compose_bytes(
            &TestFixtures::scenario(),
            &[located(1, bbox), RedactionRegion::from(&manual)],
        )
        .unwrap();

    let rects = overlay_rects(&output, 1);
    assert_eq!(rects.len(), 2);
    assert_eq!(rects[0], [100.0, 300.0, 50.0, 20.0]);
    assert_eq!(rects[0], rects[1]);
}

#[test]
fn test_unusable_regions_are_skipped() {
    let input = TestFixtures::scenario();
    let regions = vec![
        RedactionRegion {
            page: 1,
            bbox: None,
            origin: RegionOrigin::Located,
        },
        located(0, BoundingBox::new(1.0, 1.0, 1.0, 1.0)),
        located(9, BoundingBox::new(1.0, 1.0, 1.0, 1.0)),
    ];
    let output = RedactionCompositor::new().compose_bytes(&input, &regions).unwrap();

    assert_eq!(contents_entry(&output, 1), contents_entry(&input, 1));
}

#[test]
fn test_overlay_leaves_text_extractable() {
    let output = RedactionCompositor::new()
        .compose_bytes(
            &TestFixtures::scenario(),
            &[located(1, BoundingBox::new(10.0, 10.0, 40.0, 20.0))],
        )
        .unwrap();

    let pages = LayoutExtractor::new().extract_bytes(&output).unwrap();
    assert!(pages[0].runs.iter().any(|run| run.text == "张三"));
}

#[test]
fn test_compose_to_file_keeps_input() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = TestFixtures::scenario();
    let source = fixtures::write_pdf(dir.path(), "in.pdf", &bytes);
    let target = dir.path().join("out.pdf");

    let painted = RedactionCompositor::new()
        .compose(&source, &[located(1, BoundingBox::new(10.0, 10.0, 40.0, 20.0))], &target)
        .unwrap();

    assert_eq!(painted, 1);
    assert_eq!(fs::read(&source).unwrap(), bytes);
    assert_eq!(overlay_rects(&fs::read(&target).unwrap(), 1).len(), 1);
}

#[test]
fn test_write_failures() {
    let dir = tempfile::tempdir().unwrap();
    let source = fixtures::write_pdf(dir.path(), "in.pdf", &TestFixtures::scenario());
    let compositor = RedactionCompositor::new();

    let same = compositor.compose(&source, &[], &source);
    assert!(matches!(same, Err(Error::Write(_))));

    let missing_dir = compositor.compose(&source, &[], dir.path().join("no/such/dir/out.pdf"));
    assert!(matches!(missing_dir, Err(Error::Write(_))));
}
