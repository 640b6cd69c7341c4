use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use pos_ledger::{
    config::{app::DEFAULT_CONFIG_PATH, catalog::load_catalog, load_app_configuration},
    context::PosContext,
    core::{order, report, sale, seed},
    entities::OrderStatus,
    errors::Result,
    migrator::{Migrator, applied_revision, pending_revisions},
};
use sea_orm_migration::MigratorTrait;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Order and sale ledger for a small shop
#[derive(Debug, Parser)]
#[command(name = "pos-ledger", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect or change the schema revision
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Load catalog data and demo sales
    Seed {
        /// Catalog file to insert missing products and variants from
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Record a few demo sales at current prices
        #[arg(long)]
        demo_sales: bool,
    },
    /// Browse the orders ledger
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Browse the sales ledger
    Sales {
        #[command(subcommand)]
        action: SalesAction,
    },
    /// Summaries over sales and stock
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Debug, Subcommand)]
enum MigrateAction {
    /// Apply every pending revision
    Up,
    /// Revert the most recent revisions
    Down {
        /// How many revisions to revert
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show the applied and pending revisions
    Status,
    /// Drop everything and re-apply all revisions
    Fresh,
}

#[derive(Debug, Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders in this status
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Show one order with its items
    Show { id: i64 },
}

#[derive(Debug, Subcommand)]
enum SalesAction {
    /// List sales, newest first
    History,
    /// Show one sale with its items
    Show { id: i64 },
}

#[derive(Debug, Subcommand)]
enum ReportAction {
    /// Sales count, units and revenue for one day (UTC)
    Daily {
        /// Day to summarize, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Variants at or below a stock threshold
    LowStock {
        #[arg(long, default_value_t = 5)]
        threshold: i32,
    },
    /// Best-selling products by revenue
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load the application configuration
    let config = Arc::new(
        load_app_configuration(&cli.config)
            .inspect_err(|e| error!("Failed to load configuration: {}", e))?,
    );

    // 4. Open the database context; migration commands manage the schema themselves
    let ctx = match cli.command {
        Command::Migrate { .. } => PosContext::connect(config).await,
        _ => PosContext::open(config).await,
    }
    .inspect(|_| info!("Database ready"))
    .inspect_err(|e| error!("Failed to open database: {}", e))?;

    // 5. Run the command, then close the context whatever the outcome
    let outcome = run(cli.command, &ctx).await;
    if let Err(e) = &outcome {
        error!("Command failed: {}", e);
    }
    ctx.close().await?;
    outcome
}

async fn run(command: Command, ctx: &PosContext) -> Result<()> {
    let db = &ctx.db;
    match command {
        Command::Migrate { action } => match action {
            MigrateAction::Up => Migrator::up(db, None).await?,
            MigrateAction::Down { steps } => Migrator::down(db, Some(steps)).await?,
            MigrateAction::Fresh => Migrator::fresh(db).await?,
            MigrateAction::Status => {
                let current = applied_revision(db).await?;
                println!("current: {}", current.as_deref().unwrap_or("<none>"));
                for pending in pending_revisions(db).await? {
                    println!("pending: {pending}");
                }
            }
        },
        Command::Seed {
            catalog,
            demo_sales,
        } => {
            if let Some(path) = catalog {
                let report = seed::seed_catalog(db, &load_catalog(path)?).await?;
                println!(
                    "created {} product(s), {} variant(s)",
                    report.products_created, report.variants_created
                );
            }
            if demo_sales {
                println!("recorded {} demo sale(s)", seed::seed_demo_sales(db).await?);
            }
        }
        Command::Orders { action } => match action {
            OrdersAction::List { status } => {
                for o in order::list_orders(db, status).await? {
                    println!(
                        "#{:<5} {:<10} {:>10} {} {}",
                        o.id,
                        o.status,
                        o.total.round_dp(2),
                        o.created_at.format("%Y-%m-%d %H:%M"),
                        o.customer_name.unwrap_or_default()
                    );
                }
            }
            OrdersAction::Show { id } => {
                let details = order::get_order_with_items(db, id).await?;
                println!(
                    "order #{} [{}] total {}",
                    details.order.id,
                    details.order.status,
                    details.order.total.round_dp(2)
                );
                for item in details.items {
                    println!(
                        "  variant {:<6} x{:<4} @ {}",
                        item.variant_id,
                        item.quantity,
                        item.price.round_dp(2)
                    );
                }
            }
        },
        Command::Sales { action } => match action {
            SalesAction::History => {
                for s in sale::list_sales_history(db, None).await? {
                    println!(
                        "#{:<5} {} {:>10}",
                        s.id,
                        s.sale_time.format("%Y-%m-%d %H:%M"),
                        s.total.round_dp(2)
                    );
                }
            }
            SalesAction::Show { id } => {
                let details = sale::get_sale_details(db, id).await?;
                println!(
                    "sale #{} at {} total {}",
                    details.sale.id,
                    details.sale.sale_time.format("%Y-%m-%d %H:%M"),
                    details.sale.total.round_dp(2)
                );
                for line in details.items {
                    println!(
                        "  {:<24} x{:<4} @ {}",
                        line.product_name,
                        line.item.quantity,
                        line.item.price.round_dp(2)
                    );
                }
            }
        },
        Command::Report { action } => match action {
            ReportAction::Daily { date } => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                let summary = report::daily_sales_summary(db, date).await?;
                println!(
                    "{}: {} sale(s), {} unit(s), revenue {}",
                    summary.date, summary.sales_count, summary.units_sold, summary.revenue
                );
            }
            ReportAction::LowStock { threshold } => {
                for entry in report::low_stock_variants(db, threshold).await? {
                    println!(
                        "{:<16} {:<24} stock {}",
                        entry.variant.sku, entry.product_name, entry.variant.stock
                    );
                }
            }
            ReportAction::Top { limit } => {
                for entry in report::top_products(db, limit).await? {
                    println!(
                        "{:<24} {:>6} unit(s) {:>12}",
                        entry.name, entry.units, entry.revenue
                    );
                }
            }
        },
    }
    Ok(())
}
