//! CLI entry point for the TTK analyzer

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use ttk_analyzer_lib::{
    analysis::{analyze_weapons, best_variant, range_report, ttk_pivot, EngagementScenario, TtkPivot, WeaponReport},
    ammo::AmmoVariant,
    categorize::categorize_by_stk,
    config::{AnalysisConfig, WeaponTable},
    stats::tier_list,
    weapon::{WeaponClass, WeaponProfile},
};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AmmoArg {
    Base,
    Hp,
    Synth,
}

impl From<AmmoArg> for AmmoVariant {
    fn from(arg: AmmoArg) -> Self {
        match arg {
            AmmoArg::Base => AmmoVariant::Base,
            AmmoArg::Hp => AmmoVariant::HollowPoint,
            AmmoArg::Synth => AmmoVariant::Synthetic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ttk-analyzer")]
#[command(version = "0.1")]
#[command(about = "Shots-to-kill and time-to-kill analysis from weapon damage falloff tables", long_about = None)]
struct Args {
    /// Weapon table (YAML or JSON)
    #[arg(short, long)]
    weapons: PathBuf,

    /// Analysis settings (YAML or JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use parallel processing
    #[arg(short, long, default_value = "false")]
    parallel: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Show timing information
    #[arg(short, long, default_value = "false")]
    timing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// TTK grid (headshots x range) per ammo variant
    Grid {
        /// Only this weapon (name or alias)
        #[arg(long)]
        weapon: Option<String>,
        /// Health pool; defaults to the first configured target
        #[arg(long)]
        health: Option<f64>,
    },
    /// Hollow Point and Synthetic tier lists
    Tiers {
        #[arg(long)]
        health: Option<f64>,
        /// Only this weapon class (e.g. AR, Carbine, LMG, SMG)
        #[arg(long)]
        class: Option<String>,
    },
    /// Maximum effective range per shot composition
    Ranges {
        #[arg(long)]
        weapon: Option<String>,
        #[arg(long)]
        health: Option<f64>,
        #[arg(long, conflicts_with = "weapon")]
        class: Option<String>,
    },
    /// Group weapons by shots to kill at one range
    Stk {
        /// Range in meters
        #[arg(short, long)]
        range: f64,
        #[arg(long, default_value = "1")]
        headshots: u32,
        #[arg(long, value_enum, default_value = "base")]
        ammo: AmmoArg,
        #[arg(long)]
        health: Option<f64>,
    },
}

fn fail(msg: String) -> ! {
    eprintln!("{}", msg);
    process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(format!("Failed to serialize results: {}", e)),
    }
}

/// Weapons to analyze: one by name, or the whole table
fn select_weapons(table: &WeaponTable, name: Option<&str>) -> Vec<WeaponProfile> {
    match name {
        Some(name) => match table.get(name) {
            Some(w) => vec![w.clone()],
            None => fail(format!("Unknown weapon: {}", name)),
        },
        None => table.weapons.clone(),
    }
}

/// Weapons of one class, or the whole table
fn select_class(table: &WeaponTable, class: Option<&str>) -> Vec<WeaponProfile> {
    match class {
        Some(class) => {
            let weapons = table.of_class(&WeaponClass::parse(class));
            if weapons.is_empty() {
                warn!("No weapons of class {}", class);
            }
            weapons
        }
        None => table.weapons.clone(),
    }
}

/// Narrow the config to a single health pool when one is requested
fn with_health(mut config: AnalysisConfig, health: Option<f64>) -> AnalysisConfig {
    if let Some(h) = health {
        if !(h.is_finite() && h > 0.0) {
            fail(format!("Health must be positive, got {}", h));
        }
        config.health_targets = vec![h];
    }
    config
}

fn fmt_ttk(ttk: Option<f64>) -> String {
    match ttk {
        Some(ms) => format!("{:.0}", ms),
        None => "-".to_string(),
    }
}

fn print_pivot(pivot: &TtkPivot) {
    print!("  {:>6}", "HS\\m");
    for range in &pivot.ranges {
        print!("{:>8}", range);
    }
    println!();
    for (h, headshots) in pivot.headshots.iter().enumerate() {
        print!("  {:>6}", headshots);
        for cell in &pivot.cells[h] {
            print!("{:>8}", fmt_ttk(*cell));
        }
        println!();
    }
}

fn grid_command(weapons: &[WeaponProfile], config: &AnalysisConfig, parallel: bool, output: &OutputFormat) {
    let health = config.primary_health_target();
    let reports: Vec<WeaponReport> = analyze_weapons(weapons, config, parallel);

    match output {
        OutputFormat::Text => {
            for report in &reports {
                let Some(grid) = report.grid(health) else { continue };
                println!(
                    "=== {} ({}, {}) @ {} HP ===",
                    report.name, report.class, report.ammo_type, health
                );
                for &variant in &report.variants {
                    println!("[{}] TTK (ms)", variant);
                    print_pivot(&ttk_pivot(&grid.rows, variant));
                }
                if let Some(span) = report.ttk_span {
                    println!("TTK span: {:.0} - {:.0} ms", span.min_ms, span.max_ms);
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let out: Vec<_> = reports
                .iter()
                .filter_map(|report| {
                    let grid = report.grid(health)?;
                    let pivots: Vec<TtkPivot> = report.variants.iter().map(|&v| ttk_pivot(&grid.rows, v)).collect();
                    let best: Vec<_> = config
                        .range_grid
                        .iter()
                        .flat_map(|&range| {
                            (0..=config.max_headshots).map(move |hs| {
                                serde_json::json!({
                                    "range": range,
                                    "headshots": hs,
                                    "variant": best_variant(&grid.rows, range, hs),
                                })
                            })
                        })
                        .collect();
                    Some(serde_json::json!({
                        "name": report.name,
                        "health_target": health,
                        "pivots": pivots,
                        "best_variant": best,
                        "ttk_span": report.ttk_span,
                    }))
                })
                .collect();
            print_json(&out);
        }
    }
}

fn tiers_command(weapons: &[WeaponProfile], config: &AnalysisConfig, parallel: bool, output: &OutputFormat) {
    let health = config.primary_health_target();
    let reports = analyze_weapons(weapons, config, parallel);
    let hollow_point = tier_list(&reports, AmmoVariant::HollowPoint, health);
    let synthetic = tier_list(&reports, AmmoVariant::Synthetic, health);

    match output {
        OutputFormat::Text => {
            for (variant, tiers) in [(AmmoVariant::HollowPoint, &hollow_point), (AmmoVariant::Synthetic, &synthetic)] {
                println!("=== {} improvement over Base @ {} HP ===", variant, health);
                if tiers.is_empty() {
                    println!("  (no weapons)");
                }
                for (rank, stats) in tiers.iter().enumerate() {
                    println!(
                        "{:>3}. {:<14} {:<14} avg {:>6.1} ms  max {:>6.1} ms  ({} scenarios)",
                        rank + 1,
                        stats.weapon,
                        stats.class.as_str(),
                        stats.average_improvement_ms,
                        stats.max_improvement_ms,
                        stats.scenario_count
                    );
                }
                println!();
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "health_target": health,
            "hollow_point": hollow_point,
            "synthetic": synthetic,
        })),
    }
}

fn ranges_command(weapons: &[WeaponProfile], config: &AnalysisConfig, output: &OutputFormat) {
    let health = config.primary_health_target();
    let reports: Vec<_> = weapons
        .iter()
        .map(|w| {
            let ranges: Vec<_> = config
                .compositions
                .iter()
                .map(|&c| range_report(w, c, health, config))
                .collect();
            (w.name.clone(), ranges)
        })
        .collect();

    match output {
        OutputFormat::Text => {
            for (name, ranges) in &reports {
                println!("=== {} @ {} HP ===", name, health);
                for report in ranges {
                    print!("  {:<8}", report.composition.label());
                    for r in &report.ranges {
                        print!("  {} {:>5.1} m", r.variant.short_name(), r.range_m);
                        if r.variant != AmmoVariant::Base {
                            print!(" ({:+.1} m, {:+.0}%)", r.extension_m, r.extension_pct);
                        }
                    }
                    println!();
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let out: Vec<_> = reports
                .iter()
                .map(|(name, ranges)| serde_json::json!({ "name": name, "ranges": ranges }))
                .collect();
            print_json(&out);
        }
    }
}

fn stk_command(weapons: &[WeaponProfile], config: &AnalysisConfig, scenario: EngagementScenario, output: &OutputFormat) {
    if !(scenario.range.is_finite() && scenario.range >= 0.0) {
        fail(format!("Range must be non-negative, got {}", scenario.range));
    }
    let categories = categorize_by_stk(weapons, scenario, config);

    match output {
        OutputFormat::Text => {
            println!(
                "=== Shots to kill @ {} m, {} headshot(s), {} ammo, {} HP ===",
                scenario.range, scenario.headshots, scenario.variant, scenario.health_target
            );
            for (shots, names) in &categories.by_shots {
                println!("{:>3} shots: {}", shots, names.join(", "));
            }
            if !categories.unreachable.is_empty() {
                println!("unreachable: {}", categories.unreachable.join(", "));
            }
        }
        OutputFormat::Json => print_json(&categories),
    }
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    // Load inputs
    let table = match WeaponTable::from_file(&args.weapons) {
        Ok(t) => t,
        Err(e) => fail(format!("Error loading weapons: {}", e)),
    };
    let config = match &args.config {
        Some(path) => match AnalysisConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => fail(format!("Error loading config: {}", e)),
        },
        None => AnalysisConfig::default(),
    };
    info!("Loaded {} weapons from {}", table.weapons.len(), args.weapons.display());
    if table.weapons.is_empty() {
        warn!("Weapon table {} is empty", args.weapons.display());
    }

    let start = Instant::now();
    match args.command {
        Command::Grid { weapon, health } => {
            let weapons = select_weapons(&table, weapon.as_deref());
            grid_command(&weapons, &with_health(config, health), args.parallel, &args.output);
        }
        Command::Tiers { health, class } => {
            let weapons = select_class(&table, class.as_deref());
            tiers_command(&weapons, &with_health(config, health), args.parallel, &args.output);
        }
        Command::Ranges { weapon, health, class } => {
            let weapons = match class {
                Some(class) => select_class(&table, Some(class.as_str())),
                None => select_weapons(&table, weapon.as_deref()),
            };
            ranges_command(&weapons, &with_health(config, health), &args.output);
        }
        Command::Stk {
            range,
            headshots,
            ammo,
            health,
        } => {
            let config = with_health(config, health);
            let scenario = EngagementScenario {
                range,
                headshots,
                variant: ammo.into(),
                health_target: config.primary_health_target(),
            };
            stk_command(&table.weapons, &config, scenario, &args.output);
        }
    }
    let elapsed = start.elapsed();

    if args.timing {
        // stderr keeps JSON output parseable
        eprintln!("--- Performance ---");
        eprintln!("Total time: {:.3}s", elapsed.as_secs_f64());
        eprintln!(
            "Per weapon: {:.3}ms",
            elapsed.as_secs_f64() * 1000.0 / table.weapons.len().max(1) as f64
        );
    }
}
