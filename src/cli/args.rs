use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "memcost.toml")]
    pub config: PathBuf,

    /// File to which a JSON report should be saved.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the results as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Log derived quantities of every stage.
    #[arg(short, long)]
    pub verbose: bool,
}
