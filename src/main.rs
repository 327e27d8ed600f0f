use anyhow::Result;
use declump::cli::{Cli, Commands};
use declump::commands::{self, AnalyzeConfig, DetectionOverrides, FixConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = declump::cli::parse_args();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            path,
            format,
            output,
            min_fields,
            min_parameters,
            no_same_class,
            check_fields_hierarchy,
            check_parameters_hierarchy,
        } => commands::handle_analyze(AnalyzeConfig {
            path,
            format: format.map(Into::into),
            output,
            overrides: DetectionOverrides {
                min_fields,
                min_parameters,
                no_same_class,
                check_fields_hierarchy,
                check_parameters_hierarchy,
            },
        }),
        Commands::Fix {
            path,
            dry_run,
            only,
            min_fields,
            min_parameters,
            no_same_class,
        } => commands::handle_fix(FixConfig {
            path,
            dry_run,
            only,
            overrides: DetectionOverrides {
                min_fields,
                min_parameters,
                no_same_class,
                ..Default::default()
            },
        }),
        Commands::Init { force } => commands::init_config(force),
    }
}
