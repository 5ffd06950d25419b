use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use mimalloc::MiMalloc;
use partners::contract::model::{Partner, PartnerForm};
use partners::domain::editor::EditorError;
use partners::domain::filter::{PartnerColumn, PartnerFilter};
use partners::{PartnersConfig, PartnersModule};
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod table;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "partners";

/// Partners CLI - manage the counterparty registry
#[derive(Parser)]
#[command(name = "partners-cli")]
#[command(about = "Partners CLI - manage the counterparty registry")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Partners server base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of partners
    List(ListArgs),
    /// Create a partner
    Create(PartnerArgs),
    /// Update a partner; omitted fields keep their current values
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: PartnerArgs,
    },
    /// Delete a partner
    Delete { id: Uuid },
    /// Print the group labels accepted by create/update
    Groups,
    /// Check configuration
    Check,
}

#[derive(Args)]
struct ListArgs {
    /// Page size (defaults to the configured page size)
    #[arg(long)]
    page_size: Option<u32>,
    /// Page number, starting at 1
    #[arg(long)]
    page_number: Option<u32>,
    /// Keep rows whose name starts with this value (repeatable)
    #[arg(long)]
    name: Vec<String>,
    /// Keep rows whose group starts with this value (repeatable)
    #[arg(long)]
    group: Vec<String>,
    /// Keep rows whose INN starts with this value (repeatable)
    #[arg(long)]
    inn: Vec<String>,
}

#[derive(Args)]
struct PartnerArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    group: Option<String>,
    #[arg(long)]
    inn: Option<String>,
    #[arg(long)]
    kpp: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Whether the partner is a legal entity (true/false)
    #[arg(long)]
    legal_entity: Option<bool>,
}

impl PartnerArgs {
    fn apply(self, mut form: PartnerForm) -> PartnerForm {
        if let Some(v) = self.name {
            form.name = v;
        }
        if let Some(v) = self.group {
            form.group = v;
        }
        if let Some(v) = self.inn {
            form.inn = v;
        }
        if let Some(v) = self.kpp {
            form.kpp = v;
        }
        if let Some(v) = self.description {
            form.description = Some(v);
        }
        if let Some(v) = self.legal_entity {
            form.has_legal_entity = v;
        }
        form
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.client.home_dir));
    tracing::info!("Partners CLI starting");

    let mut partners_cfg: PartnersConfig = config.module_config(MODULE_NAME)?;
    if let Some(base_url) = cli.base_url {
        partners_cfg.base_url = base_url;
    }

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Check => check_config(&config, &partners_cfg),
        Commands::Groups => {
            for group in &partners_cfg.groups {
                println!("{}", group);
            }
            Ok(())
        }
        Commands::List(list) => {
            let module = PartnersModule::from_config(partners_cfg)?;
            list_partners(&module, list).await
        }
        Commands::Create(fields) => {
            let module = PartnersModule::from_config(partners_cfg)?;
            let editor = module.editor();
            let form = fields.apply(editor.open_create());
            report_save(editor.submit(&form).await)
        }
        Commands::Update { id, fields } => {
            let module = PartnersModule::from_config(partners_cfg)?;
            let current = find(&module, id).await?;
            let editor = module.editor();
            let form = fields.apply(editor.open_edit(current));
            report_save(editor.submit(&form).await)
        }
        Commands::Delete { id } => {
            let module = PartnersModule::from_config(partners_cfg)?;
            let current = find(&module, id).await?;
            let deleted = module
                .api()
                .delete_partner(current)
                .await
                .with_context(|| format!("failed to delete partner {}", id))?;
            println!("Deleted {} ({})", deleted.id, deleted.name);
            Ok(())
        }
    }
}

async fn find(module: &PartnersModule, id: Uuid) -> Result<Partner> {
    module
        .api()
        .find_partner(id)
        .await?
        .ok_or_else(|| anyhow!("partner {} not found", id))
}

async fn list_partners(module: &PartnersModule, args: ListArgs) -> Result<()> {
    let page_size = args
        .page_size
        .unwrap_or(module.config().default_page_size);
    let page_number = args.page_number.unwrap_or(1);
    let page = module.api().list_partners(page_size, page_number).await?;

    let mut filter = PartnerFilter::new();
    for (column, values) in [
        (PartnerColumn::Name, args.name),
        (PartnerColumn::Group, args.group),
        (PartnerColumn::Inn, args.inn),
    ] {
        for value in values {
            filter.select(column, value);
        }
    }

    let rows = filter.apply(&page.data);
    print!("{}", table::render(&rows));
    let meta = &page.meta_data;
    println!(
        "page {} of {}, {} partner(s) total, {} shown",
        meta.page_number,
        meta.page_count,
        meta.items_count,
        rows.len()
    );
    Ok(())
}

fn report_save(result: Result<Partner, EditorError>) -> Result<()> {
    match result {
        Ok(saved) => {
            println!("Saved {} ({})", saved.id, saved.name);
            Ok(())
        }
        Err(e) => {
            if let Some(fields) = e.field_errors() {
                for (field, messages) in fields.iter() {
                    for message in messages {
                        eprintln!("  {}: {}", field, message);
                    }
                }
                bail!("partner not saved: invalid fields");
            }
            Err(anyhow::Error::new(e).context("partner not saved"))
        }
    }
}

fn check_config(config: &AppConfig, partners_cfg: &PartnersConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let api_base = partners_cfg.api_base()?;
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Partners API: {}", api_base);
    println!("{}", config.to_yaml()?);
    println!("{}", serde_yaml::to_string(partners_cfg)?);
    Ok(())
}
