//! Speed-up Planner
//!
//! Command-line front end: loads the session from SQLite, runs one command,
//! and saves the session back when the command changed it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use speedup_planner::report;
use speedup_planner::{
    Activity, Duration, EntryFields, EntryId, PackId, Planner, PlannerRecord, SpeedupCategory,
    TrainingInput, TrainingSpec, db, training,
};

const DEFAULT_TRAINING_TIME: &str = "4h 57m";
const DEFAULT_TROOPS_PER_BATCH: &str = "426";
const DEFAULT_POINTS_PER_TROOP: &str = "830";
const DEFAULT_REDUCTION_BONUS: &str = "20";

#[derive(Parser)]
#[command(name = "speedup-planner")]
#[command(about = "Speed-up allocation and points efficiency calculator for Whiteout Survival")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "SPEEDUP_PLANNER_DB", default_value = "speedups.db")]
    database: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Show or edit available speed-up minutes
    Inventory {
        #[command(subcommand)]
        command: InventoryCommand,
    },

    /// Draw minutes for a category (category pool first, then general)
    Allocate {
        /// general, construction, training or research
        category: SpeedupCategory,

        /// Minutes requested
        minutes: f64,

        /// Show the allocation without changing the inventory
        #[arg(long)]
        dry_run: bool,
    },

    /// Calculate training batches and points for a block of minutes
    Train {
        #[command(flatten)]
        troops: TroopArgs,

        /// Minutes to spend (defaults to everything usable for training)
        #[arg(short, long)]
        minutes: Option<f64>,

        /// Points already earned
        #[arg(long, default_value = "0")]
        current_points: f64,

        /// Points goal; reports the minutes still needed
        #[arg(long)]
        target: Option<f64>,

        /// Draw the minutes from the inventory
        #[arg(long)]
        commit: bool,
    },

    /// Hall of Chiefs entries and efficiency
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },

    /// Pack purchases ranked by cost per minute
    Pack {
        #[command(subcommand)]
        command: PackCommand,
    },

    /// Write the whole session to a JSON file
    Export {
        path: PathBuf,
    },

    /// Replace the session with the contents of a JSON file
    Import {
        path: PathBuf,

        /// Confirm replacing the current session
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum InventoryCommand {
    /// List minutes per category
    Show,

    /// Overwrite the minutes of one category
    Set {
        category: SpeedupCategory,
        minutes: f64,
    },
}

#[derive(Args)]
struct TroopArgs {
    /// Base training time per batch, e.g. "4h 57m"
    #[arg(long, default_value = DEFAULT_TRAINING_TIME)]
    time: Duration,

    /// Troops per batch
    #[arg(long, default_value = DEFAULT_TROOPS_PER_BATCH)]
    troops: u32,

    /// Points per troop
    #[arg(long, default_value = DEFAULT_POINTS_PER_TROOP)]
    points_per_troop: f64,

    /// Training time reduction bonus in percent
    #[arg(long, default_value = DEFAULT_REDUCTION_BONUS)]
    bonus: f64,
}

#[derive(Args)]
struct PowerArgs {
    description: String,

    /// Power gained
    #[arg(long)]
    power: f64,

    /// Points per power (30 or 45 in game)
    #[arg(long, default_value = "30")]
    points_per_power: f64,

    /// Speed-up minutes spent
    #[arg(long)]
    minutes: f64,

    /// Record the spend without drawing it from the inventory
    #[arg(long)]
    no_allocate: bool,
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// Add a construction entry
    AddConstruction(PowerArgs),

    /// Add a research entry
    AddResearch(PowerArgs),

    /// Add a training entry
    AddTraining {
        #[command(flatten)]
        troops: TroopArgs,

        #[arg(long)]
        description: Option<String>,

        /// Speed-up minutes spent
        #[arg(long)]
        minutes: f64,

        /// Record the spend without drawing it from the inventory
        #[arg(long)]
        no_allocate: bool,
    },

    /// Change fields of an existing entry
    Update {
        id: u64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        power: Option<f64>,
        #[arg(long)]
        points_per_power: Option<f64>,
        #[arg(long)]
        minutes: Option<f64>,
        #[arg(long)]
        time: Option<Duration>,
        #[arg(long)]
        troops: Option<u32>,
        #[arg(long)]
        points_per_troop: Option<f64>,
        #[arg(long)]
        bonus: Option<f64>,
    },

    /// List entries with their points and efficiency
    List,

    /// Points and efficiency per activity
    Summary,

    /// Remove one entry
    Remove { id: u64 },

    /// Remove all entries, or those of one activity
    Clear {
        #[arg(long)]
        activity: Option<Activity>,

        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PackCommand {
    /// Record a purchased pack
    Add {
        name: String,
        price: f64,

        /// Number of 60-minute speed-ups
        #[arg(long, default_value = "0")]
        count_60min: u32,

        /// Number of 5-minute speed-ups
        #[arg(long, default_value = "0")]
        count_5min: u32,

        /// Purchase date as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Packs from best to worst value
    Rank,

    /// Totals across all packs
    Totals,

    /// Remove one pack
    Remove { id: u64 },

    /// Remove all packs
    Clear {
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    let mut planner = Planner::from_record(&db::load_state(&conn)?)
        .context("Stored session is invalid")?;

    let changed = run(cli.command, &mut planner, &cli.database)?;
    if changed {
        db::save_state(&mut conn, &planner.to_record())?;
    }

    Ok(())
}

/// Execute one command; returns whether the session must be saved.
fn run(command: Commands, planner: &mut Planner, database: &Path) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Database initialized at: {}", database.display());
            Ok(false)
        }

        Commands::Inventory { command } => match command {
            InventoryCommand::Show => {
                print!("{}", report::format_inventory(planner.inventory()));
                Ok(false)
            }
            InventoryCommand::Set { category, minutes } => {
                planner.inventory_mut().set(category, minutes)?;
                print!("{}", report::format_inventory(planner.inventory()));
                Ok(true)
            }
        },

        Commands::Allocate {
            category,
            minutes,
            dry_run,
        } => {
            if dry_run {
                let plan = planner.inventory().preview(category, minutes)?;
                println!("(dry run)");
                print!("{}", plan);
                Ok(false)
            } else {
                let result = planner.inventory_mut().allocate(category, minutes)?;
                print!("{}", result);
                Ok(true)
            }
        }

        Commands::Train {
            troops,
            minutes,
            current_points,
            target,
            commit,
        } => {
            let mut input = TrainingInput::new(
                troops.time,
                troops.troops,
                troops.bonus,
                troops.points_per_troop,
                0.0,
            )
            .with_current_points(current_points);
            if let Some(target) = target {
                input = input.with_target_points(target);
            }
            let requested = minutes.unwrap_or_else(|| {
                planner
                    .inventory()
                    .available_for(SpeedupCategory::Training)
            });

            if commit {
                let plan = planner.plan_training(&input, requested)?;
                print!("{}", plan.allocation);
                println!();
                print!("{}", plan.result);
                Ok(true)
            } else {
                input.allocated_minutes = requested;
                print!("{}", training::compute(&input)?);
                Ok(false)
            }
        }

        Commands::Ledger { command } => run_ledger(command, planner),

        Commands::Pack { command } => run_pack(command, planner),

        Commands::Export { path } => {
            let json = serde_json::to_string_pretty(&planner.to_record())?;
            fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported session to {}", path.display());
            Ok(false)
        }

        Commands::Import { path, yes } => {
            if !yes {
                bail!("Import replaces the current session; pass --yes to confirm");
            }
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let record: PlannerRecord = serde_json::from_str(&text)
                .with_context(|| format!("Invalid session file {}", path.display()))?;
            *planner = Planner::from_record(&record)?;
            println!(
                "Imported {} entries and {} packs",
                planner.ledger().len(),
                planner.packs().len()
            );
            Ok(true)
        }
    }
}

fn run_ledger(command: LedgerCommand, planner: &mut Planner) -> Result<bool> {
    match command {
        LedgerCommand::AddConstruction(args) => add_power_entry(planner, Activity::Construction, args),
        LedgerCommand::AddResearch(args) => add_power_entry(planner, Activity::Research, args),

        LedgerCommand::AddTraining {
            troops,
            description,
            minutes,
            no_allocate,
        } => {
            let spec = TrainingSpec {
                description,
                base_duration: troops.time,
                troops_per_batch: troops.troops,
                points_per_troop: troops.points_per_troop,
                reduction_bonus_percent: troops.bonus,
            };
            let id = if no_allocate {
                planner
                    .ledger_mut()
                    .add_entry(Activity::Training, &spec.to_fields(minutes))?
            } else {
                let recorded = planner.record_training_entry(&spec, minutes)?;
                print!("{}", recorded.allocation);
                recorded.id
            };
            print_entry(planner, id);
            Ok(true)
        }

        LedgerCommand::Update {
            id,
            description,
            power,
            points_per_power,
            minutes,
            time,
            troops,
            points_per_troop,
            bonus,
        } => {
            let id = EntryId(id);
            let Some(entry) = planner.ledger().get(id) else {
                bail!("No ledger entry with id {}", id);
            };
            let mut fields = entry.to_record().fields;
            if description.is_some() {
                fields.description = description;
            }
            if power.is_some() {
                fields.power = power;
            }
            if points_per_power.is_some() {
                fields.points_per_power = points_per_power;
            }
            if minutes.is_some() {
                fields.speedup_minutes_spent = minutes;
            }
            if let Some(time) = time {
                fields.days = Some(i64::from(time.days()));
                fields.hours = Some(i64::from(time.hours()));
                fields.minutes = Some(i64::from(time.minutes()));
                fields.seconds = Some(i64::from(time.seconds()));
            }
            if let Some(troops) = troops {
                fields.troops_per_batch = Some(i64::from(troops));
            }
            if points_per_troop.is_some() {
                fields.points_per_troop = points_per_troop;
            }
            if bonus.is_some() {
                fields.reduction_bonus_percent = bonus;
            }

            planner.ledger_mut().update_entry(id, &fields)?;
            print_entry(planner, id);
            Ok(true)
        }

        LedgerCommand::List => {
            if planner.ledger().is_empty() {
                println!("No ledger entries. Add one with 'ledger add-construction' or similar.");
            } else {
                print!("{}", report::format_ledger(planner.ledger()));
            }
            Ok(false)
        }

        LedgerCommand::Summary => {
            print!("{}", planner.ledger().summary());
            Ok(false)
        }

        LedgerCommand::Remove { id } => {
            let id = EntryId(id);
            if planner.ledger_mut().remove_entry(id) {
                println!("Removed entry {}", id);
                Ok(true)
            } else {
                println!("Entry {} not found; nothing removed", id);
                Ok(false)
            }
        }

        LedgerCommand::Clear { activity, yes } => {
            if !yes {
                bail!("Clearing entries cannot be undone; pass --yes to confirm");
            }
            let removed = planner.ledger_mut().remove_all(activity);
            println!("Removed {} entries", removed);
            Ok(removed > 0)
        }
    }
}

fn add_power_entry(planner: &mut Planner, activity: Activity, args: PowerArgs) -> Result<bool> {
    let id = if args.no_allocate {
        let fields = EntryFields::power_entry(args.description, args.power, args.points_per_power, args.minutes);
        planner.ledger_mut().add_entry(activity, &fields)?
    } else {
        let recorded = planner.record_power_entry(
            activity,
            &args.description,
            args.power,
            args.points_per_power,
            args.minutes,
        )?;
        print!("{}", recorded.allocation);
        recorded.id
    };
    print_entry(planner, id);
    Ok(true)
}

fn print_entry(planner: &Planner, id: EntryId) {
    if let Some(entry) = planner.ledger().get(id) {
        println!(
            "Entry {} ({}): {} points, {:.1} min, {:.2} points/min",
            entry.id,
            entry.activity,
            report::format_number(entry.points()),
            entry.speedup_minutes_spent,
            entry.efficiency()
        );
    }
}

fn run_pack(command: PackCommand, planner: &mut Planner) -> Result<bool> {
    match command {
        PackCommand::Add {
            name,
            price,
            count_60min,
            count_5min,
            date,
        } => {
            let packs = planner.packs_mut();
            let id = match date {
                Some(date) => packs.add_dated_pack(&name, price, count_60min, count_5min, &date)?,
                None => packs.add_pack(&name, price, count_60min, count_5min)?,
            };
            if let Some(pack) = planner.packs().get(id) {
                println!(
                    "Pack {} '{}': {} minutes at {:.4} per minute",
                    pack.id,
                    pack.name,
                    pack.total_minutes(),
                    pack.cost_per_minute()
                );
            }
            Ok(true)
        }

        PackCommand::Rank => {
            if planner.packs().is_empty() {
                println!("No packs recorded. Add one with 'pack add'.");
            } else {
                print!("{}", report::format_pack_ranking(planner.packs()));
            }
            Ok(false)
        }

        PackCommand::Totals => {
            print!("{}", planner.packs().totals());
            Ok(false)
        }

        PackCommand::Remove { id } => {
            let id = PackId(id);
            if planner.packs_mut().remove(id) {
                println!("Removed pack {}", id);
                Ok(true)
            } else {
                println!("Pack {} not found; nothing removed", id);
                Ok(false)
            }
        }

        PackCommand::Clear { yes } => {
            if !yes {
                bail!("Clearing packs cannot be undone; pass --yes to confirm");
            }
            let removed = planner.packs_mut().remove_all();
            println!("Removed {} packs", removed);
            Ok(removed > 0)
        }
    }
}
