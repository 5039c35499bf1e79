//! The `rql` command line: manage a configuration, and translate and run
//! RQL expressions against the SQLite database it describes.

pub mod state;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::info_span;

use query_engine_execution::query;
use query_engine_sql::sql;
use query_engine_translation::translation;
use rql_configuration::environment::Environment;
use rql_configuration::{Configuration, ParsedConfiguration};

/// The commands understood by the CLI.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Write an initial configuration, connecting through `RQL_DATABASE_URL`.
    Initialize,
    /// Introspect the database and update the configuration's metadata.
    Update,
    /// Print the SQL an expression translates to, without running it.
    Translate(QueryArgs),
    /// Run an expression and print its result as JSON.
    Query(QueryArgs),
    /// Run an expression as a page, with links to the neighbouring pages.
    Paginate(QueryArgs),
    /// Print the SQL of an expression and how SQLite would run it.
    Explain(QueryArgs),
}

/// An RQL expression over one collection.
#[derive(Clone, Debug, clap::Args)]
pub struct QueryArgs {
    /// The table or view to query.
    pub collection: String,
    /// The RQL expression, in either call or query string syntax.
    #[arg(default_value = "")]
    pub expression: String,
    /// A limit that takes precedence over the configured default.
    #[arg(long)]
    pub limit: Option<u32>,
}

/// The context in which a command runs.
pub struct Context<Env: Environment> {
    pub context_path: PathBuf,
    pub environment: Env,
}

/// Run a command in a given directory, writing its output.
pub async fn run(
    command: Command,
    context: Context<impl Environment>,
    output: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Initialize => initialize(&context.context_path).await?,
        Command::Update => update(&context).await?,
        Command::Translate(args) => {
            let configuration = read_configuration(&context).await?;
            let plan = translate(&configuration, &args)?.plan;
            write_statement(output, &query::statement(&plan))?;
        }
        Command::Query(args) => {
            let configuration = read_configuration(&context).await?;
            let composed = translate(&configuration, &args)?;
            let state = create_state(&configuration).await?;
            let result = query::execute(&state.pool, &state.metrics, &composed.plan).await?;
            writeln!(output, "{}", serde_json::to_string_pretty(&result)?)?;
        }
        Command::Paginate(args) => {
            let configuration = read_configuration(&context).await?;
            let composed = translate(&configuration, &args)?;
            let state = create_state(&configuration).await?;
            let result = query::paginate(
                &state.pool,
                &state.metrics,
                &composed.plan,
                composed.expression.as_ref(),
            )
            .await?;
            writeln!(output, "{}", serde_json::to_string_pretty(&result)?)?;
        }
        Command::Explain(args) => {
            let configuration = read_configuration(&context).await?;
            let plan = translate(&configuration, &args)?.plan;
            let state = create_state(&configuration).await?;
            let (statement, query_plan) = query::explain(&state.pool, &plan).await?;
            writeln!(output, "{statement}\n\n{query_plan}")?;
        }
    }
    Ok(())
}

/// Write an initial configuration, refusing to overwrite an existing one.
async fn initialize(context_path: &Path) -> anyhow::Result<()> {
    let configuration_file = context_path.join(rql_configuration::version1::CONFIGURATION_FILENAME);
    if tokio::fs::try_exists(&configuration_file).await? {
        anyhow::bail!(
            "a configuration already exists at {}",
            configuration_file.display()
        );
    }

    rql_configuration::write_parsed_configuration(ParsedConfiguration::initial(), context_path)
        .await?;
    tracing::info!(path = %context_path.display(), "Wrote the initial configuration");
    Ok(())
}

/// Introspect the database and write back the configuration with fresh metadata.
async fn update(context: &Context<impl Environment>) -> anyhow::Result<()> {
    let input = rql_configuration::parse_configuration(&context.context_path).await?;
    let output = rql_configuration::configure(&input, &context.environment).await?;
    if output == input {
        tracing::info!("The configuration is up to date");
        return Ok(());
    }
    rql_configuration::write_parsed_configuration(output, &context.context_path).await?;
    tracing::info!(path = %context.context_path.display(), "Updated the configuration");
    Ok(())
}

async fn read_configuration(context: &Context<impl Environment>) -> anyhow::Result<Configuration> {
    let parsed = rql_configuration::parse_configuration(&context.context_path).await?;
    Ok(rql_configuration::make_runtime_configuration(
        parsed,
        &context.environment,
    )?)
}

fn translate(
    configuration: &Configuration,
    args: &QueryArgs,
) -> anyhow::Result<translation::query::ComposedQuery> {
    let env =
        translation::helpers::Env::new(&configuration.metadata, &configuration.query_defaults);
    let composed = info_span!("Translate query", collection = %args.collection).in_scope(|| {
        translation::query::translate(
            &env,
            &[args.collection.as_str()],
            &args.expression,
            args.limit,
        )
    })?;
    Ok(composed)
}

async fn create_state(configuration: &Configuration) -> anyhow::Result<state::State> {
    let mut registry = prometheus::Registry::new();
    Ok(state::create_state(configuration, &mut registry).await?)
}

/// Write a statement formatted for reading, followed by its parameters.
fn write_statement(output: &mut impl Write, statement: &sql::string::SQL) -> std::io::Result<()> {
    writeln!(output, "{}", query::format_sql(&statement.sql))?;
    for (index, param) in statement.params.iter().enumerate() {
        match param {
            sql::string::Param::String(value) => {
                writeln!(output, "-- ?{} = {value:?}", index + 1)?;
            }
        }
    }
    Ok(())
}
