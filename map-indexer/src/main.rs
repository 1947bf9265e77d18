use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use map_common::{compression, CatalogSnapshot, MapCollection, MapDocument, SNAPSHOT_VERSION};
use map_filter::service::parse_function_response;
use map_filter::{build_tag_index, load_catalog, project, Catalog, ServiceConfig, SnapshotService};

const CATALOG_FILE: &str = "catalog.bin";

fn cli() -> Command {
    let verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Show detailed output")
        .action(ArgAction::SetTrue)
        .global(true);

    Command::new("map-indexer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build and inspect map catalog snapshots")
        .subcommand_required(true)
        .arg(verbose)
        .subcommand(
            Command::new("build")
                .about("Build a compressed catalog from a getAllMapData JSON dump")
                .arg(Arg::new("source")
                    .short('s')
                    .long("source")
                    .value_name("DUMP_JSON")
                    .help("JSON response of the map data function")
                    .required(true))
                .arg(Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("OUTPUT_DIR")
                    .help("Directory to write catalog.bin into")
                    .required(true)),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show the maps and tags visible for a tag selection")
                .arg(Arg::new("catalog")
                    .short('c')
                    .long("catalog")
                    .value_name("CATALOG_FILE")
                    .help("Compressed catalog built by `build`")
                    .required(true))
                .arg(Arg::new("tag")
                    .short('t')
                    .long("tag")
                    .value_name("TAG")
                    .help("Select a tag; repeat to require several")
                    .action(ArgAction::Append)),
        )
        .subcommand(
            Command::new("scan")
                .about("List .pk3 maps in a directory and compare them with a dump")
                .arg(Arg::new("maps")
                    .short('m')
                    .long("maps")
                    .value_name("MAPS_DIR")
                    .help("Directory containing .pk3 map files")
                    .required(true))
                .arg(Arg::new("source")
                    .short('s')
                    .long("source")
                    .value_name("DUMP_JSON")
                    .help("JSON response of the map data function")),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");
    init_logging(verbose);

    let result = match matches.subcommand() {
        Some(("build", args)) => build_command(args, verbose),
        Some(("inspect", args)) => inspect_command(args, verbose).await,
        Some(("scan", args)) => scan_command(args, verbose),
        _ => Err("unknown command".to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String, String> {
    args.get_one::<String>(name)
        .ok_or_else(|| format!("missing --{}", name))
}

fn read_dump(path: &Path) -> Result<Vec<MapDocument>, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    parse_function_response(&json).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

fn build_command(args: &ArgMatches, verbose: bool) -> Result<(), String> {
    let source = PathBuf::from(required(args, "source")?);
    let output = PathBuf::from(required(args, "output")?);

    let start_time = std::time::Instant::now();
    println!("Reading map dump: {}", source.display());
    let maps = read_dump(&source)?;

    let path = build_catalog(maps, &output, verbose)?;

    println!("Catalog written to {} in {:.2}s", path.display(), start_time.elapsed().as_secs_f32());
    Ok(())
}

/// Validate the maps and write them as `catalog.bin` under `output_dir`.
fn build_catalog(
    maps: Vec<MapDocument>,
    output_dir: &Path,
    verbose: bool,
) -> Result<PathBuf, String> {
    let collection = MapCollection::new(maps).map_err(|e| e.to_string())?;

    let index = build_tag_index(&collection);
    println!("Found {} maps with {} distinct tags", collection.len(), index.len());
    if verbose {
        for entry in &index {
            println!("  {:<24} {}", entry.tag, entry.match_count());
        }
    }

    if !output_dir.exists() {
        fs::create_dir_all(output_dir).map_err(|e| {
            format!("cannot create output directory '{}': {}", output_dir.display(), e)
        })?;
    }

    let snapshot = CatalogSnapshot::new(collection.as_slice().to_vec(), SNAPSHOT_VERSION);
    let bytes = compression::to_compressed(&snapshot, SNAPSHOT_VERSION).map_err(|e| e.to_string())?;

    let path = output_dir.join(CATALOG_FILE);
    fs::write(&path, &bytes).map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
    if verbose {
        println!("Compressed size: {} bytes", bytes.len());
    }
    Ok(path)
}

async fn inspect_command(args: &ArgMatches, verbose: bool) -> Result<(), String> {
    let path = PathBuf::from(required(args, "catalog")?);
    let tags: Vec<String> = args
        .get_many::<String>("tag")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let data = fs::read(&path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    if verbose {
        let snapshot: CatalogSnapshot =
            compression::from_compressed(&data).map_err(|e| e.to_string())?;
        println!(
            "Catalog v{} built {} ({} maps, {} tags)",
            snapshot.metadata.version,
            format_timestamp(&snapshot.metadata.created_at),
            snapshot.metadata.map_count,
            snapshot.metadata.tag_count,
        );
    }

    let catalog = inspect_catalog(&data, &tags).await?;
    let view = project(&catalog);

    println!("{}", view.status_badge);
    for card in view.maps.unwrap_or_default() {
        if verbose && !card.screenshots.is_empty() {
            println!("  {} ({})", card.id, card.screenshots.join(", "));
        } else {
            println!("  {}", card.id);
        }
    }

    println!("Feature tags ({}):", view.tags_badge);
    for chip in view.tags {
        let marker = if chip.selected { "*" } else { " " };
        println!(" {}{:<24} {}", marker, chip.tag, chip.match_count);
    }
    Ok(())
}

/// Load a snapshot through the regular load path and apply `tags` in order.
async fn inspect_catalog(data: &[u8], tags: &[String]) -> Result<Catalog, String> {
    let service = SnapshotService::from_compressed(data).map_err(|e| e.to_string())?;

    let mut catalog = Catalog::new();
    load_catalog(&mut catalog, &service, &ServiceConfig::default())
        .await
        .map_err(|e| e.to_string())?;

    for tag in tags {
        catalog.on_tag_toggled(tag).map_err(|e| e.to_string())?;
    }
    Ok(catalog)
}

/// Result of comparing a map directory with a dump.
#[derive(Debug, Default, PartialEq)]
struct ScanReport {
    /// Map names found as `.pk3` files, sorted
    on_disk: Vec<String>,
    /// On disk but absent from the dump
    missing_from_dump: Vec<String>,
    /// In the dump but with no `.pk3` on disk
    missing_on_disk: Vec<String>,
    /// In the dump without any feature tag
    untagged: Vec<String>,
}

fn scan_command(args: &ArgMatches, verbose: bool) -> Result<(), String> {
    let dir = PathBuf::from(required(args, "maps")?);
    if !dir.is_dir() {
        return Err(format!("maps directory does not exist: '{}'", dir.display()));
    }

    let dump = match args.get_one::<String>("source") {
        Some(source) => Some(read_dump(Path::new(source))?),
        None => None,
    };

    let report = scan_maps(&dir, dump.as_deref());

    println!("Found {} map files in {}", report.on_disk.len(), dir.display());
    if verbose {
        for name in &report.on_disk {
            println!("  {}", name);
        }
    }
    if dump.is_some() {
        print_list("Not in dump", &report.missing_from_dump);
        print_list("No map file", &report.missing_on_disk);
        print_list("Untagged", &report.untagged);
    }
    Ok(())
}

fn print_list(label: &str, names: &[String]) {
    println!("{}: {}", label, names.len());
    for name in names {
        println!("  {}", name);
    }
}

/// Collect `.pk3` map names (file stem) under `dir` and compare with `dump`.
fn scan_maps(dir: &Path, dump: Option<&[MapDocument]>) -> ScanReport {
    let mut on_disk: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pk3"))
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .collect();
    on_disk.sort();
    on_disk.dedup();

    let Some(dump) = dump else {
        return ScanReport {
            on_disk,
            ..ScanReport::default()
        };
    };

    let disk_names: HashSet<&str> = on_disk.iter().map(String::as_str).collect();
    let dump_names: HashSet<&str> = dump.iter().map(|m| m.id.as_str()).collect();

    let missing_from_dump = on_disk
        .iter()
        .filter(|name| !dump_names.contains(name.as_str()))
        .cloned()
        .collect();
    let missing_on_disk = dump
        .iter()
        .filter(|m| !disk_names.contains(m.id.as_str()))
        .map(|m| m.id.to_string())
        .collect();
    let untagged = dump
        .iter()
        .filter(|m| m.feature_tags.is_empty())
        .map(|m| m.id.to_string())
        .collect();

    ScanReport {
        on_disk,
        missing_from_dump,
        missing_on_disk,
        untagged,
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    fn dump() -> Vec<MapDocument> {
        vec![
            MapDocument::new("ut4_abbey", ["castle", "water"]),
            MapDocument::new("ut4_turnpike", ["urban", "night"]),
            MapDocument::new("ut4_casa", Vec::<String>::new()),
        ]
    }

    #[test]
    fn timestamps_print_in_utc() -> TestResult {
        let ts: DateTime<Utc> = "2024-03-09T17:05:42Z".parse()?;

        assert_eq!(format_timestamp(&ts), "2024-03-09 17:05:42 UTC");
        Ok(())
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn inspect_args_collect_repeated_tags() -> TestResult {
        let matches = cli().try_get_matches_from([
            "map-indexer", "inspect", "-c", "catalog.bin", "-t", "castle", "--tag", "water",
        ])?;

        let (_, args) = matches.subcommand().ok_or("no subcommand")?;
        let tags: Vec<&String> = args.get_many::<String>("tag").ok_or("no tags")?.collect();
        assert_eq!(tags, vec!["castle", "water"]);
        Ok(())
    }

    #[tokio::test]
    async fn built_catalog_filters_on_inspect() -> TestResult {
        let dir = tempfile::tempdir()?;

        let path = build_catalog(dump(), dir.path(), false)?;
        let data = fs::read(path)?;
        let catalog = inspect_catalog(&data, &["castle".to_string()]).await?;

        let ids: Vec<&str> = catalog.visible().maps.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["ut4_abbey"]);
        Ok(())
    }

    #[test]
    fn build_rejects_duplicate_ids() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut maps = dump();
        maps.push(MapDocument::new("ut4_abbey", ["snow"]));

        assert!(build_catalog(maps, dir.path(), false).is_err());
        Ok(())
    }

    #[test]
    fn scan_compares_disk_with_dump() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("ut4_abbey.pk3"), b"")?;
        fs::create_dir(dir.path().join("extra"))?;
        fs::write(dir.path().join("extra").join("ut4_uptown.PK3"), b"")?;
        fs::write(dir.path().join("readme.txt"), b"")?;

        let maps = dump();
        let report = scan_maps(dir.path(), Some(&maps));

        assert_eq!(report.on_disk, vec!["ut4_abbey", "ut4_uptown"]);
        assert_eq!(report.missing_from_dump, vec!["ut4_uptown"]);
        assert_eq!(report.missing_on_disk, vec!["ut4_turnpike", "ut4_casa"]);
        assert_eq!(report.untagged, vec!["ut4_casa"]);
        Ok(())
    }

    #[test]
    fn scan_without_dump_only_lists_files() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("ut4_casa.pk3"), b"")?;

        let report = scan_maps(dir.path(), None);

        assert_eq!(report.on_disk, vec!["ut4_casa"]);
        assert!(report.missing_on_disk.is_empty());
        Ok(())
    }
}
