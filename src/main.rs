//! Chitra CLI - browse the filter catalog and render previews.

use anyhow::{anyhow, bail, Context, Result};
use chitra::prelude::*;
use image::{Rgba, RgbaImage};
use std::path::PathBuf;

/// Where the last previewed filter is remembered.
const LAST_VIEWED_FILE: &str = ".chitra_last_viewed.json";

/// Default configuration file.
const CONFIG_FILE: &str = "chitra.toml";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let result = match args[1].as_str() {
        "list" => list_filters(&args[2..]),
        "info" => match args.get(2) {
            Some(name) => filter_info(name, &args[3..]),
            None => Err(anyhow!("please specify a filter name")),
        },
        "preview" => preview(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("Chitra filter browser v{}", chitra::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list [--json]                 List the catalog by category");
    println!("  info <name>                   Show one catalog entry");
    println!("  preview <name|--last>         Render one entry to a PNG");
    println!("  help                          Show this help message");
    println!();
    println!("Preview options:");
    println!("  --value <v>     Control value, clamped to the entry's range");
    println!("  --out <file>    Output file (default: <name>.png)");
    println!();
    println!("Common options:");
    println!("  --config <file> Configuration file (default: {})", CONFIG_FILE);
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Default)]
struct Options {
    positional: Vec<String>,
    json: bool,
    last: bool,
    value: Option<f32>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => options.json = true,
            "--last" => options.last = true,
            "--value" => {
                let raw = args.get(i + 1).context("--value needs a number")?;
                options.value = Some(raw.parse().with_context(|| format!("invalid value '{}'", raw))?);
                i += 1;
            }
            "--out" => {
                options.out = Some(PathBuf::from(args.get(i + 1).context("--out needs a path")?));
                i += 1;
            }
            "--config" => {
                options.config = Some(PathBuf::from(args.get(i + 1).context("--config needs a path")?));
                i += 1;
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            positional => options.positional.push(positional.to_string()),
        }
        i += 1;
    }
    Ok(options)
}

fn load_config(options: &Options) -> Result<BrowserConfig> {
    let config = match &options.config {
        Some(path) => BrowserConfig::load(path)?,
        None => BrowserConfig::load_or_default(CONFIG_FILE)?,
    };
    Ok(config)
}

fn load_catalog(config: &BrowserConfig, assets: &AssetLibrary) -> FilterCatalog {
    let report = build_catalog(&CatalogContext::from_config(assets, config));
    if !report.rejected.is_empty() {
        eprintln!("{} filter(s) unavailable:", report.rejected.len());
        for error in &report.rejected {
            eprintln!("  - {}", error);
        }
    }
    report.catalog
}

// ============================================================================
// Commands
// ============================================================================

fn list_filters(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = load_config(&options)?;
    let assets = AssetLibrary::from_dir(&config.assets.dir);
    let catalog = load_catalog(&config, &assets);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&catalog.summaries())?);
        return Ok(());
    }

    println!("Available filters ({} total):", catalog.len());
    println!();
    for category in catalog.categories() {
        println!("  {}", category);
        for descriptor in catalog.entries(category) {
            let range = match descriptor.range() {
                Some(r) if descriptor.has_parameter_callback() => {
                    format!(" [{} .. {}, default {}]", r.min, r.max, r.default)
                }
                _ => String::new(),
            };
            println!("      • {}{}", descriptor.name(), range);
        }
        println!();
    }
    Ok(())
}

fn filter_info(name: &str, args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = load_config(&options)?;
    let assets = AssetLibrary::from_dir(&config.assets.dir);
    let catalog = load_catalog(&config, &assets);

    let Some((category, descriptor)) = catalog.find(name) else {
        let matches = catalog.search(name);
        if matches.is_empty() {
            bail!("no filter named '{}'", name);
        }
        println!("No filter named '{}'. Did you mean:", name);
        for (category, descriptor) in matches {
            println!("  • {} ({})", descriptor.name(), category);
        }
        return Ok(());
    };

    println!("Filter: {}", descriptor.name());
    println!("Category: {}", category);
    println!("Kind: {}", descriptor.kind());
    if let Some(description) = descriptor.description() {
        println!("Description: {}", description);
    }
    match descriptor.range() {
        Some(r) if descriptor.has_parameter_callback() => {
            println!("Control: {} .. {} (default {})", r.min, r.max, r.default);
        }
        _ => println!("Control: none"),
    }
    Ok(())
}

fn preview(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = load_config(&options)?;
    let assets = AssetLibrary::from_dir(&config.assets.dir);
    let catalog = load_catalog(&config, &assets);

    let (category, descriptor) = if options.last {
        let last = LastViewed::load(LAST_VIEWED_FILE)?
            .context("no filter has been previewed yet")?;
        catalog
            .find_in(&last.category, &last.name)
            .map(|d| (last.category.as_str(), d))
            .or_else(|| catalog.find(&last.name))
            .map(|(c, d)| (c.to_string(), d.clone()))
            .with_context(|| format!("'{}' is no longer in the catalog", last.name))?
    } else {
        let name = options
            .positional
            .first()
            .context("please specify a filter name or --last")?;
        catalog
            .find(name)
            .map(|(c, d)| (c.to_string(), d.clone()))
            .with_context(|| format!("no filter named '{}'", name))?
    };

    let source = match assets.load(&config.assets.source) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("{}; using a generated test image", e);
            Arc::new(test_image(config.display.canvas()))
        }
    };

    let mut engine =
        SoftwareEngine::new().with_options(EngineOptions::from(&config.engine));
    let view = Arc::new(Mutex::new(RenderView::new()));
    let mut surface = DisplaySurface::open(&mut engine, descriptor.clone(), source, view)?;

    if let Some(value) = options.value {
        match surface.slide_to(&mut engine, value) {
            Ok(ControlOutcome::Ignored) => println!("{} has no control; value ignored", descriptor.name()),
            Ok(ControlOutcome::Applied { value }) => println!("Applied {} = {}", descriptor.name(), value),
            Err(e) => eprintln!("{}", e),
        }
    }

    let status = surface.status().clone();
    let out = options
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", descriptor.name())));
    let frame = surface.latest_frame();
    surface.close(&mut engine)?;

    let saved = match &frame {
        Some(frame) => {
            frame
                .image()
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            true
        }
        None => false,
    };

    LastViewed::new(category, descriptor.name()).save(LAST_VIEWED_FILE)?;

    match (saved, status) {
        (true, SurfaceStatus::Ready) => println!("Wrote {}", out.display()),
        (true, SurfaceStatus::Failed(reason)) => {
            println!("Wrote {} (last frame failed: {})", out.display(), reason)
        }
        (false, SurfaceStatus::Failed(reason)) => bail!("nothing rendered: {}", reason),
        (false, SurfaceStatus::Ready) => bail!("nothing rendered"),
    }
    Ok(())
}

/// Color gradient used when the bundled photo is missing.
fn test_image(size: Size) -> RgbaImage {
    let (w, h) = (size.width.max(1), size.height.max(1));
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([
            (x * 255 / w) as u8,
            (y * 255 / h) as u8,
            ((x + y) * 127 / (w + h)) as u8,
            255,
        ])
    })
}
