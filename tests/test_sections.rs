mod common;

use common::*;
use countfire::core::view;
use countfire::{ClearScope, Session, SharedSectionStore, ZoomLimits};

fn page(index: usize) -> PageRaster {
    raster(index, blank_page(1000, 800))
}

#[test]
fn test_sections_survive_view_changes() -> anyhow::Result<()> {
    let page = page(0);
    let mut store = SectionStore::new();
    let state = ViewState::new(2.0, Point::new(100.0, 50.0), ZoomLimits::default())?;

    // Dragged from (20, 40) to (220, 140) on screen at 2x zoom.
    let view_rect = Rect::from_corners(Point::new(220.0, 140.0), Point::new(20.0, 40.0));
    let section = store.add("legend", &view_rect, 0, &state, &page)?;
    assert_eq!(section.rect, Rect::from_corners(Point::new(110.0, 70.0), Point::new(210.0, 120.0)));

    let zoomed = state.zoom_about(Point::new(300.0, 300.0), 3.0)?.scroll_by_view(-40.0, 25.0)?;
    let stored = store.get("legend").expect("section was added");
    assert_eq!(stored.rect, section.rect);

    // Drawing the stored section in the new view lands where the document
    // content now is.
    let on_screen = view::rect_to_view(&stored.rect, &zoomed)?;
    let back = view::rect_to_document(&on_screen, &zoomed)?;
    assert!((back.x_min - section.rect.x_min).abs() < 1e-9);
    assert!((back.y_max - section.rect.y_max).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_section_is_clamped_to_page() -> anyhow::Result<()> {
    let page = page(0);
    let mut store = SectionStore::new();
    let state = ViewState::default();

    let overhang = Rect::from_origin_size(900.0, -30.0, 300.0, 100.0);
    let section = store.add("edge", &overhang, 0, &state, &page)?;

    assert_eq!(section.rect, Rect::from_corners(Point::new(900.0, 0.0), Point::new(1000.0, 70.0)));
    Ok(())
}

#[test]
fn test_zero_width_section_is_rejected() -> anyhow::Result<()> {
    let page = page(0);
    let mut store = SectionStore::new();
    let flat = Rect::from_corners(Point::new(50.0, 10.0), Point::new(50.0, 200.0));

    let result = store.add("flat", &flat, 0, &ViewState::default(), &page);

    assert!(matches!(result, Err(Error::DegenerateRegion(_))));
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn test_section_off_page_is_rejected() -> anyhow::Result<()> {
    let page = page(0);
    let mut store = SectionStore::new();

    let off_page = Rect::from_origin_size(2000.0, 10.0, 50.0, 50.0);
    let result = store.add_document_rect("gone", &off_page, &page);

    assert!(matches!(result, Err(Error::DegenerateRegion(_))));
    Ok(())
}

#[test]
fn test_duplicate_names_are_rejected() -> anyhow::Result<()> {
    let first = page(0);
    let second = page(1);
    let mut store = SectionStore::new();
    store.add_document_rect("A", &Rect::from_origin_size(0.0, 0.0, 10.0, 10.0), &first)?;

    let elsewhere = Rect::from_origin_size(20.0, 20.0, 10.0, 10.0);
    let result = store.add_document_rect("A", &elsewhere, &second);

    assert!(matches!(result, Err(Error::DuplicateName(ref name)) if name == "A"));
    assert_eq!(store.len(), 1);
    Ok(())
}

#[test]
fn test_undo_removes_only_latest() -> anyhow::Result<()> {
    let page = page(0);
    let mut store = SectionStore::new();
    store.add_document_rect("first", &Rect::from_origin_size(0.0, 0.0, 50.0, 50.0), &page)?;
    store.add_document_rect("second", &Rect::from_origin_size(100.0, 0.0, 50.0, 50.0), &page)?;

    let undone = store.undo().expect("one section to undo");

    assert_eq!(undone.name, "second");
    let names: Vec<String> = store.list(0).into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["first"]);
    Ok(())
}

#[test]
fn test_clear_by_page_and_all() -> anyhow::Result<()> {
    let (p0, p1) = (page(0), page(1));
    let mut store = SectionStore::new();
    store.add_document_rect("a", &Rect::from_origin_size(0.0, 0.0, 50.0, 50.0), &p0)?;
    store.add_document_rect("b", &Rect::from_origin_size(0.0, 0.0, 50.0, 50.0), &p1)?;
    store.add_document_rect("c", &Rect::from_origin_size(60.0, 0.0, 50.0, 50.0), &p1)?;

    assert_eq!(store.clear(ClearScope::Page(1)), 2);
    assert_eq!(store.pages(), vec![0]);
    assert_eq!(store.clear(ClearScope::All), 1);
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn test_shared_store_snapshot_is_detached() -> anyhow::Result<()> {
    let page = page(0);
    let shared = SharedSectionStore::default();
    let state = ViewState::default();
    shared.add("a", &Rect::from_origin_size(0.0, 0.0, 40.0, 40.0), 0, &state, &page)?;

    let snapshot = shared.snapshot();
    shared.add("b", &Rect::from_origin_size(50.0, 0.0, 40.0, 40.0), 0, &state, &page)?;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(shared.list(0).len(), 2);
    Ok(())
}

#[test]
fn test_session_round_trip_restores_sections() -> anyhow::Result<()> {
    let pages = vec![page(0), page(1)];
    let mut store = SectionStore::new();
    let north = Rect::from_origin_size(10.0, 10.0, 200.0, 100.0);
    let south = Rect::from_origin_size(10.0, 400.0, 200.0, 100.0);
    store.add_document_rect("north", &north, &pages[0])?;
    store.add_document_rect("south", &south, &pages[1])?;
    let config = DetectionConfig::default().with_area(80.0, 900.0);

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("session.json");
    Session::from_store(Some("plan.tif".to_string()), &store, config.clone()).save(&path)?;

    let session = Session::load(&path)?;
    let restored = SectionStore::restore(&session.records, &pages)?;

    assert_eq!(session.config, config);
    assert_eq!(restored.all(), store.all());
    Ok(())
}

#[test]
fn test_restore_rejects_missing_page() -> anyhow::Result<()> {
    let pages = vec![page(0)];
    let mut store = SectionStore::new();
    let other = page(3);
    store.add_document_rect("far", &Rect::from_origin_size(0.0, 0.0, 20.0, 20.0), &other)?;

    let result = SectionStore::restore(&store.to_records(), &pages);

    assert!(matches!(result, Err(Error::InvalidParameter(_))));
    Ok(())
}
