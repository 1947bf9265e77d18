use map_common::{MapCollection, MapDocument};
use map_filter::{
    build_tag_index, load_catalog, project, recompute, Catalog, ConnectivityStatus, SelectionState,
    ServiceConfig, SnapshotService,
};
use testresult::TestResult;

fn maps() -> Vec<MapDocument> {
    vec![
        MapDocument::new("A", ["forest", "night"]).with_screenshots(["a.jpg"]),
        MapDocument::new("B", ["forest"]),
        MapDocument::new("C", ["desert"]),
    ]
}

fn chips(catalog: &Catalog) -> Vec<(String, usize)> {
    project(catalog)
        .tags
        .into_iter()
        .map(|chip| (chip.tag, chip.match_count))
        .collect()
}

fn card_ids(catalog: &Catalog) -> Vec<String> {
    project(catalog)
        .maps
        .unwrap_or_default()
        .into_iter()
        .map(|card| card.id.to_string())
        .collect()
}

#[tokio::test]
async fn forest_night_walkthrough() -> TestResult {
    let mut catalog = Catalog::new();
    load_catalog(&mut catalog, &SnapshotService::new(maps()), &ServiceConfig::default()).await?;

    assert_eq!(catalog.status(), ConnectivityStatus::Connected);
    assert_eq!(card_ids(&catalog), vec!["A", "B", "C"]);
    assert_eq!(
        chips(&catalog),
        vec![("forest".to_string(), 2), ("night".to_string(), 1), ("desert".to_string(), 1)]
    );

    catalog.on_tag_toggled("forest")?;
    assert_eq!(card_ids(&catalog), vec!["A", "B"]);
    assert_eq!(chips(&catalog), vec![("forest".to_string(), 2), ("night".to_string(), 1)]);

    catalog.on_tag_toggled("night")?;
    assert_eq!(card_ids(&catalog), vec!["A"]);
    assert_eq!(chips(&catalog), vec![("forest".to_string(), 1), ("night".to_string(), 1)]);
    assert_eq!(project(&catalog).status_badge, "database IS connected | 1 maps visible");

    catalog.on_tag_toggled("night")?;
    assert_eq!(card_ids(&catalog), vec!["A", "B"]);
    Ok(())
}

#[test]
fn double_toggle_round_trips_through_the_engine() -> TestResult {
    let collection = MapCollection::new(maps())?;
    let start = SelectionState::new().toggle("forest");

    let again = start.toggle("night").toggle("night");

    assert_eq!(again, start);
    assert_eq!(recompute(&collection, &again), recompute(&collection, &start));
    assert_eq!(
        recompute(&collection, &SelectionState::new()).tag_index,
        build_tag_index(&collection)
    );
    Ok(())
}
