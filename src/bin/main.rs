//! virtcol CLI - Compile filters, sorts and formulas to SQL
//!
//! Usage:
//!   virtcol where <filter> --schema <schema.json> --table <table>
//!   virtcol sort <sort> --schema <schema.json> --table <table>
//!   virtcol formula [<formula>] [--column <name>] --schema <schema.json> --table <table>
//!   virtcol validate --schema <schema.json>
//!
//! Examples:
//!   virtcol where "(Age,gt,18)~and(Name,like,John)" --schema crm.json --table People
//!   virtcol sort "-Created,Name" --schema crm.json --table People --dialect mssql
//!   virtcol formula "{Price} * {Quantity}" --schema shop.json --table Orders

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use virtcol::compile::{
    compile_formula, compile_sort_str, compile_where, validate_formula_column, CompileContext,
};
use virtcol::config::Settings;
use virtcol::formula::{parse_formula, FormulaNode};
use virtcol::model::Schema;
use virtcol::sql::{Dialect, Expr};
use virtcol::validation;

#[derive(Parser)]
#[command(name = "virtcol")]
#[command(about = "virtcol - compiles filters, sorts and formulas over virtual columns to SQL")]
#[command(version)]
struct Cli {
    /// Path to the schema JSON
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Table id, title or physical name to compile against
    #[arg(short, long, global = true)]
    table: Option<String>,

    /// SQL dialect to generate (overrides config and schema)
    #[arg(short, long, global = true)]
    dialect: Option<DialectArg>,

    /// Path to a virtcol.toml (default: search the usual locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "sql")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a where-clause DSL string
    Where {
        /// Filter, e.g. "(Age,gt,18)~and(Name,like,John)"
        filter: String,
    },

    /// Compile a sort string
    Sort {
        /// Sort, e.g. "-Created,Name"
        sort: String,
    },

    /// Compile a formula (text or JSON tree), or validate a formula column
    Formula {
        /// Formula source, e.g. "{Price} * {Quantity}"
        formula: Option<String>,

        /// Validate the stored formula of this column instead
        #[arg(long)]
        column: Option<String>,
    },

    /// Check a schema for dangling references and cycles
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Pg,
    Mysql,
    Sqlite,
    Mssql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Pg => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Mssql => Dialect::MsSql,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// SQL with literals inlined
    Sql,
    /// SQL with placeholders, followed by the bound values as JSON
    Params,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
    .map_err(|e| e.to_string())?;

    let schema = load_schema(cli, &settings)?;

    if let Commands::Validate = cli.command {
        return cmd_validate(&schema);
    }

    let table = cli
        .table
        .as_deref()
        .ok_or("--table is required for this command")?;
    let table_id = schema
        .find_table(table)
        .map(|t| t.id.clone())
        .ok_or_else(|| format!("table '{}' not found", table))?;

    let mut ctx = CompileContext::new(&schema, &table_id)
        .map_err(|e| e.to_string())?
        .with_options(settings.compile_options().map_err(|e| e.to_string())?);
    if let Some(now) = settings.now().map_err(|e| e.to_string())? {
        ctx = ctx.with_now(now);
    }

    let dialect = schema.dialect();
    match &cli.command {
        Commands::Where { filter } => {
            let compiled = compile_where(&mut ctx, filter).map_err(|e| e.to_string())?;
            match &compiled.predicate {
                Some(predicate) => print_expr(predicate, dialect, cli.output),
                None => println!("-- no conditions"),
            }
        }
        Commands::Sort { sort } => {
            let order = compile_sort_str(&mut ctx, sort).map_err(|e| e.to_string())?;
            let items: Vec<String> = order.iter().map(|o| o.to_sql(dialect)).collect();
            println!("{}", items.join(", "));
        }
        Commands::Formula { formula, column } => {
            let expr = match (formula, column) {
                (_, Some(column)) => validate_formula_column(&mut ctx, column),
                (Some(source), None) => {
                    let node = match FormulaNode::from_json(source) {
                        Ok(node) => node,
                        Err(_) => parse_formula(source).map_err(|e| e.to_string())?,
                    };
                    compile_formula(&mut ctx, &node)
                }
                (None, None) => return Err("either a formula or --column is required".into()),
            }
            .map_err(|e| e.to_string())?;
            print_expr(&expr, dialect, cli.output);
        }
        Commands::Validate => {}
    }

    Ok(())
}

fn load_schema(cli: &Cli, settings: &Settings) -> Result<Schema, String> {
    let path = cli.schema.as_ref().ok_or("--schema is required")?;
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    let schema = Schema::from_json(&source)
        .map_err(|e| format!("Error parsing schema '{}': {}", path.display(), e))?;

    let dialect = match cli.dialect {
        Some(arg) => Some(Dialect::from(arg)),
        None => settings.dialect().map_err(|e| e.to_string())?,
    };
    Ok(match dialect {
        Some(dialect) => schema.with_dialect(dialect),
        None => schema,
    })
}

fn print_expr(expr: &Expr, dialect: Dialect, output: OutputFormat) {
    match output {
        OutputFormat::Sql => println!("{}", expr.to_sql(dialect)),
        OutputFormat::Params => {
            let rendered = expr.render(dialect);
            println!("{}", rendered.sql);
            match serde_json::to_string(&rendered.params) {
                Ok(params) => println!("-- params: {}", params),
                Err(e) => eprintln!("Error encoding params: {}", e),
            }
        }
    }
}

fn cmd_validate(schema: &Schema) -> Result<(), String> {
    match validation::validate(schema) {
        Ok(()) => {
            println!("OK: {} tables are valid", schema.tables().len());
            Ok(())
        }
        Err(errors) => {
            eprintln!("Validation errors:");
            for error in &errors {
                eprintln!("  {}", error);
            }
            Err(format!("{} problem(s) found", errors.len()))
        }
    }
}
