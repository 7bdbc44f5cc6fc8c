use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use qbrowse::cache::CacheStore;
use qbrowse::catalog;
use qbrowse::config::{self, QbrowseConfig};
use qbrowse::models::{NewQuestion, QuestionAge, QuestionType, SortOrder, SortType};
use qbrowse::output::{json as json_out, table};
use qbrowse::page::BrowsePage;
use qbrowse::remote::client::QueryClient;
use qbrowse::remote::trpc::TrpcQuestionService;
use qbrowse::search::field::ParamCodec;
use qbrowse::search::filters::{FilterAction, MultiFieldKind, SearchState};
use qbrowse::sync::navigator::{MemoryHistory, Navigator};
use qbrowse::sync::params::Location;

#[derive(Parser)]
#[command(name = "qbrowse", version, about = "Question Browser: filter, sort and contribute interview questions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to cache file (default: ~/.qbrowse/cache.db)
    #[arg(long, global = true, env = "QBROWSE_CACHE")]
    cache: Option<PathBuf>,

    /// Do not read or write the local result cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// API base URL (overrides QBROWSE_API_URL and config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API token (overrides QBROWSE_API_KEY and config)
    #[arg(long, global = true)]
    api_key: Option<String>,
}

/// Page URL plus filter actions, applied in one update.
///
/// Order within the update: --clear, then additions and removals, then
/// --age and the sort flags.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Page URL or query string to start from (e.g. "?companies=Google&sortOrder=asc")
    #[arg(long)]
    url: Option<String>,

    /// Clear every filter (sort is kept)
    #[arg(long)]
    clear: bool,

    #[arg(long = "add-company", value_name = "NAME")]
    add_companies: Vec<String>,
    #[arg(long = "remove-company", value_name = "NAME")]
    remove_companies: Vec<String>,

    #[arg(long = "add-type", value_name = "TYPE")]
    add_types: Vec<String>,
    #[arg(long = "remove-type", value_name = "TYPE")]
    remove_types: Vec<String>,

    #[arg(long = "add-role", value_name = "ROLE")]
    add_roles: Vec<String>,
    #[arg(long = "remove-role", value_name = "ROLE")]
    remove_roles: Vec<String>,

    #[arg(long = "add-location", value_name = "LOCATION")]
    add_locations: Vec<String>,
    #[arg(long = "remove-location", value_name = "LOCATION")]
    remove_locations: Vec<String>,

    /// Question age: last-month, last-6-months, last-year, all
    #[arg(long, value_parser = parse_token::<QuestionAge>)]
    age: Option<QuestionAge>,

    /// Sort order: asc or desc
    #[arg(long, value_parser = parse_token::<SortOrder>)]
    sort_order: Option<SortOrder>,

    /// Sort type: top or new
    #[arg(long, value_parser = parse_token::<SortType>)]
    sort_type: Option<SortType>,
}

impl FilterArgs {
    fn actions(&self) -> Vec<FilterAction> {
        let mut actions = Vec::new();
        if self.clear {
            actions.push(FilterAction::ClearFilters);
        }

        let lists = [
            (MultiFieldKind::Companies, &self.add_companies, &self.remove_companies),
            (MultiFieldKind::QuestionTypes, &self.add_types, &self.remove_types),
            (MultiFieldKind::Roles, &self.add_roles, &self.remove_roles),
            (MultiFieldKind::Locations, &self.add_locations, &self.remove_locations),
        ];
        for (field, add, remove) in lists {
            for value in add {
                actions.push(FilterAction::Toggle {
                    field,
                    value: value.clone(),
                    checked: true,
                });
            }
            for value in remove {
                actions.push(FilterAction::Toggle {
                    field,
                    value: value.clone(),
                    checked: false,
                });
            }
        }

        if let Some(age) = self.age {
            actions.push(FilterAction::SetQuestionAge(age));
        }
        if let Some(order) = self.sort_order {
            actions.push(FilterAction::SetSortOrder(order));
        }
        if let Some(sort) = self.sort_type {
            actions.push(FilterAction::SetSortType(sort));
        }
        actions
    }
}

fn parse_token<T: ParamCodec>(s: &str) -> Result<T, String> {
    T::from_param(s).ok_or_else(|| format!("unrecognized value: {s}"))
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OptionField {
    Companies,
    QuestionTypes,
    QuestionAge,
    Roles,
    Locations,
    SortOrder,
    SortType,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse questions for a page URL and filter changes
    Browse {
        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum question cards to print
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Only show cached results; never call the API
        #[arg(long)]
        offline: bool,

        /// Also print the filter sidebar
        #[arg(long)]
        show_filters: bool,
    },

    /// Print the canonical page URL after applying filter changes
    Url {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List the options of one filter, with the current selection checked
    Options {
        #[arg(value_enum)]
        field: OptionField,

        /// Page URL or query string providing the current selection
        #[arg(long)]
        url: Option<String>,

        /// Typeahead text matched against option labels
        #[arg(long)]
        query: Option<String>,
    },

    /// Contribute a question you were asked
    Contribute {
        /// Company the question was asked at
        #[arg(long)]
        company: String,

        /// Question text
        #[arg(long)]
        content: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        role: String,

        /// Question type: coding, system_design, behavioral, theory
        #[arg(long = "type", value_parser = parse_token::<QuestionType>)]
        question_type: QuestionType,

        /// When the question was seen (YYYY-MM-DD or YYYY-MM)
        #[arg(long)]
        seen_at: String,
    },

    /// Inspect or clear the local result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage ~/.qbrowse/config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version, endpoints and cache info
    Info,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Remove every cached result
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented config template if none exists
    Init,
    /// Print the config with secrets redacted
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;
    let config = QbrowseConfig::load()?;

    match cli.command {
        Commands::Browse {
            ref filters,
            limit,
            offline,
            show_filters,
        } => {
            let mut page = mount_page(&cli, &config, filters.url.as_deref())?;
            page.dispatch(filters.actions())?;

            if offline {
                if !page.load_offline() {
                    bail!("No cached results for these filters. Run without --offline first.");
                }
            } else if let Err(e) = page.load() {
                let has_data = page.render().is_some_and(|v| v.questions.is_some());
                if !has_data {
                    return Err(e).context("Failed to load questions");
                }
            }

            let view = page
                .render()
                .context("Page did not reconcile with its URL")?;

            if json_output {
                json_out::print_json(&view)?;
            } else {
                table::print_page(&view, limit);
                if show_filters {
                    table::print_filter_panel(&view.filters);
                }
            }
        }

        Commands::Url { ref filters } => {
            let mut page = mount_page(&cli, &config, filters.url.as_deref())?;
            page.dispatch(filters.actions())?;
            let location = page
                .navigator()
                .current()
                .context("No current location")?;

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "url": location.to_string(),
                    "has_filters": page.state().has_filters(),
                }))?;
            } else {
                println!("{location}");
            }
        }

        Commands::Options {
            field,
            ref url,
            ref query,
        } => {
            let location = Location::parse(url.as_deref().unwrap_or_default(), &config.page_path())?;
            let state = SearchState::from_query(&location.query);
            let (label, options) = match field {
                OptionField::Companies => ("Company", state.company_options()),
                OptionField::QuestionTypes => ("Question types", state.question_type_options()),
                OptionField::QuestionAge => ("Question age", state.question_age_options()),
                OptionField::Roles => ("Roles", state.role_options()),
                OptionField::Locations => ("Location", state.location_options()),
                OptionField::SortOrder => ("Sort order", state.sort_order_options()),
                OptionField::SortType => ("Sort type", state.sort_type_options()),
            };
            let options = catalog::filter_options(options, query.as_deref().unwrap_or_default());

            if json_output {
                json_out::print_json(&options)?;
            } else {
                table::print_options(label, &options);
            }
        }

        Commands::Contribute {
            ref company,
            ref content,
            ref location,
            ref role,
            question_type,
            ref seen_at,
        } => {
            let question = NewQuestion {
                company_id: non_empty("company", company)?,
                content: non_empty("content", content)?,
                location: non_empty("location", location)?,
                question_type,
                role: non_empty("role", role)?,
                seen_at: parse_seen_at(seen_at)?,
            };

            let api = config.api.as_ref();
            let api_key = config::resolve_api_key(cli.api_key.as_deref(), api)?;
            if api_key.is_none() {
                bail!(
                    "Contributing requires an API token. Provide via --api-key, {} env var, or ~/.qbrowse/config.toml",
                    config::API_KEY_ENV
                );
            }
            let service = TrpcQuestionService::new(
                config.base_url(cli.api_url.as_deref()),
                api_key,
                config.timeout(),
            )?;
            let mut client = QueryClient::new(service, open_store(&cli)?);
            client.create(&question)?;

            if json_output {
                json_out::print_json(&serde_json::json!({ "submitted": question }))?;
            } else {
                println!("Submitted: {}", question.content);
            }
        }

        Commands::Cache { ref action } => {
            let path = cache_path(&cli)?;
            let store = CacheStore::open(&path)?;
            match action {
                CacheAction::Stats => {
                    let stats = store.stats()?;
                    if json_output {
                        json_out::print_json(&stats)?;
                    } else {
                        table::print_cache_stats(&stats);
                    }
                }
                CacheAction::Clear => {
                    let removed = store.clear()?;
                    println!("Removed {removed} cached result{}", if removed == 1 { "" } else { "s" });
                }
            }
        }

        Commands::Config { ref action } => match action {
            ConfigAction::Init => {
                let path = config::config_path()?;
                if config::init_config()? {
                    println!("Wrote {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
            ConfigAction::Show => {
                println!("{}", config.display_redacted());
            }
        },

        Commands::Info => {
            let path = cache_path(&cli)?;
            let store = CacheStore::open(&path)?;
            let stats = store.stats()?;
            let schema_ver = store
                .schema_version()?
                .unwrap_or_else(|| "unknown".to_string());
            let base_url = config
                .base_url(cli.api_url.as_deref())
                .unwrap_or_else(|| qbrowse::remote::trpc::DEFAULT_BASE_URL.to_string());

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "api_url": base_url,
                    "page_path": config.page_path(),
                    "schema_version": schema_ver,
                    "cache_path": store.path.display().to_string(),
                    "cache_size_bytes": stats.db_size_bytes,
                    "cached_results": stats.entries,
                }))?;
            } else {
                println!("qbrowse v{}", env!("CARGO_PKG_VERSION"));
                println!("  API:        {base_url}");
                println!("  Page:       {}", config.page_path());
                println!("  Schema:     v{schema_ver}");
                println!("  Cache:      {}", store.path.display());
                println!("  Size:       {}", table::format_bytes(stats.db_size_bytes));
                println!("  Results:    {}", stats.entries);
            }
        }
    }

    Ok(())
}

fn cache_path(cli: &Cli) -> Result<PathBuf> {
    match cli.cache {
        Some(ref path) => Ok(path.clone()),
        None => CacheStore::default_path(),
    }
}

fn open_store(cli: &Cli) -> Result<Option<CacheStore>> {
    if cli.no_cache {
        return Ok(None);
    }
    Ok(Some(CacheStore::open(&cache_path(cli)?)?))
}

fn mount_page(
    cli: &Cli,
    config: &QbrowseConfig,
    url: Option<&str>,
) -> Result<BrowsePage<MemoryHistory, TrpcQuestionService>> {
    let location = Location::parse(url.unwrap_or_default(), &config.page_path())?;
    let api_key = config::resolve_api_key(cli.api_key.as_deref(), config.api.as_ref())?;
    let service = TrpcQuestionService::new(
        config.base_url(cli.api_url.as_deref()),
        api_key,
        config.timeout(),
    )?;
    let client = QueryClient::new(service, open_store(cli)?);
    BrowsePage::mount(MemoryHistory::new(location), client, Utc::now())
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("--{field} must not be empty");
    }
    Ok(value.to_string())
}

fn parse_seen_at(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .with_context(|| format!("Invalid --seen-at date: {s}. Use YYYY-MM-DD or YYYY-MM"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid --seen-at time")?;
    Ok(midnight.and_utc())
}
