use anyhow::{Context, Result};
use choropleth_rs::api::Client;
use choropleth_rs::config::{LayerConfig, MapConfig};
use choropleth_rs::display::{HoverReadout, Legend, format_value, map_locale};
use choropleth_rs::features::{FeatureStore, MemoryFeatureStore};
use choropleth_rs::loader::{LoadOutcome, StatDataLoader, UnresolvedRow};
use choropleth_rs::region::RegionKeyResolver;
use choropleth_rs::style::{HoverState, OpacityMode, ScaleMode, StyleDescriptor};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "choro",
    version,
    about = "Map regional statistics onto choropleth styles"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a statistics table onto GeoJSON layers and print each region's style.
    Render(RenderArgs),
    /// Show which region keys a (locality, country) pair normalizes to.
    Resolve(ResolveArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum ModeArg {
    Linear,
    Log,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Statistics table (URL or path), `{ "values": [[locality, country, ..., value], ...] }`
    #[arg(short, long)]
    source: String,
    /// GeoJSON layer as ID_PROPERTY=SOURCE (repeatable). Defaults to the configured layers.
    #[arg(short, long = "layer")]
    layers: Vec<String>,
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Interpolation mode (overrides config).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Fixed fill opacity in [0, 1] (overrides config).
    #[arg(long, conflicts_with = "scaled_opacity")]
    opacity: Option<f64>,
    /// Scale fill opacity with the gradient position.
    #[arg(long, default_value_t = false)]
    scaled_opacity: bool,
    /// Locale for number formatting (en, de, fr, es, it, pt, nl).
    #[arg(long)]
    locale: Option<String>,
    /// Render this region as hovered and print its readout.
    #[arg(long)]
    hover: Option<String>,
    /// Also list regions without a value.
    #[arg(long, default_value_t = false)]
    all: bool,
    /// Print a JSON report instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[arg(long)]
    locality: String,
    #[arg(long, default_value = "")]
    country: String,
    /// JSON config file (for extra region aliases).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct RegionReport {
    id: String,
    name: String,
    value: Option<f64>,
    style: StyleDescriptor,
}

#[derive(Serialize)]
struct RenderReport {
    legend: Option<Legend>,
    hover: Option<HoverReadout>,
    unresolved: Vec<UnresolvedRow>,
    regions: Vec<RegionReport>,
}

fn parse_layer(s: &str) -> Result<LayerConfig> {
    let (prop, source) = s
        .split_once('=')
        .filter(|(p, src)| !p.trim().is_empty() && !src.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("invalid --layer {:?}, expected ID_PROPERTY=SOURCE", s))?;
    Ok(LayerConfig::new(source.trim(), prop.trim()))
}

fn load_config(path: Option<&PathBuf>) -> Result<MapConfig> {
    match path {
        Some(p) => MapConfig::from_path(p),
        None => Ok(MapConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Resolve(args) => cmd_resolve(args),
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut cfg = load_config(args.config.as_ref())?;
    if !args.layers.is_empty() {
        cfg.layers = args
            .layers
            .iter()
            .map(|s| parse_layer(s))
            .collect::<Result<_>>()?;
    }
    match args.mode {
        Some(ModeArg::Linear) => cfg.scale.mode = ScaleMode::Linear,
        Some(ModeArg::Log) => cfg.scale.mode = ScaleMode::Logarithmic,
        None => {}
    }
    if let Some(a) = args.opacity {
        cfg.scale.opacity = OpacityMode::Fixed(a);
    }
    if args.scaled_opacity {
        cfg.scale.opacity = OpacityMode::Scaled;
    }
    if let Some(l) = args.locale {
        cfg.locale = l;
    }
    cfg.validate()?;

    let client = Client::new()?;
    let mut store = MemoryFeatureStore::new();
    for layer in &cfg.layers {
        let doc = client
            .fetch_json(&layer.source)
            .with_context(|| format!("load layer {}", layer.source))?;
        let added = store.add_geojson(&doc, &layer.id_property)?;
        log::info!("indexed {} features from {}", added, layer.source);
    }

    let mut loader = StatDataLoader::new(RegionKeyResolver::with_aliases(&cfg.region_aliases));
    let outcome = loader.load(&client, &args.source, &mut store)?;
    let locale = map_locale(&cfg.locale);

    let regions: Vec<RegionReport> = store
        .ids()
        .into_iter()
        .filter_map(|id| {
            let value = store.stat_value(&id);
            if value.is_none() && !args.all {
                return None;
            }
            let hover = if args.hover.as_deref() == Some(id.as_str()) {
                HoverState::Hovered
            } else {
                HoverState::Normal
            };
            let style = cfg.scale.style(value, loader.range(), hover);
            Some(RegionReport {
                name: store.display_name(&id),
                id,
                value,
                style,
            })
        })
        .collect();

    let report = RenderReport {
        legend: Legend::from_range(loader.range(), locale),
        hover: args
            .hover
            .as_deref()
            .and_then(|id| HoverReadout::for_feature(&store, id, loader.range(), locale)),
        unresolved: outcome.unresolved.clone(),
        regions,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report, &outcome, locale);
    }
    Ok(())
}

fn print_table(report: &RenderReport, outcome: &LoadOutcome, locale: &num_format::Locale) {
    match &report.legend {
        Some(l) => println!("min={}  max={}", l.min_text, l.max_text),
        None => println!("min=NA  max=NA"),
    }
    for r in &report.regions {
        let value = r
            .value
            .map(|v| format_value(v, locale))
            .unwrap_or_else(|| "NA".to_string());
        println!(
            "{}\t{}\t{}\t{}\topacity={}\tweight={}\tz={}\t{}",
            r.id,
            value,
            r.style.fill_color,
            r.style.fill_hex(),
            r.style.fill_opacity,
            r.style.stroke_weight,
            r.style.z_index,
            if r.style.visible { "visible" } else { "hidden" }
        );
    }
    if let Some(h) = &report.hover {
        println!("hover: {} = {} at {:.1}%", h.name, h.value_text, h.offset_percent);
    }
    eprintln!(
        "Assigned {} regions, {} unresolved, {} skipped rows",
        outcome.assignments.len(),
        outcome.unresolved.len(),
        outcome.skipped
    );
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let cfg = load_config(args.config.as_ref())?;
    let resolver = RegionKeyResolver::with_aliases(&cfg.region_aliases);
    match resolver.candidates(&args.locality, &args.country) {
        Some(c) => {
            println!("primary: {}", c.primary);
            match c.fallback {
                Some(fb) => println!("fallback: {}", fb),
                None => println!("fallback: -"),
            }
        }
        None => println!("not found"),
    }
    Ok(())
}
