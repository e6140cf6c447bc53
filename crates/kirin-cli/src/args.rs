use clap::{Args, Parser, Subcommand, ValueEnum};
use kirin_linker::DeserializationStrategy;
use std::path::PathBuf;

/// CLI arguments for the kirin binary.
#[derive(Parser, Debug)]
#[command(
    name = "kirin",
    version,
    about = "Supertype resolution, fake overrides and IR linking for kirin modules"
)]
pub struct CliArgs {
    /// Path to kirin.json. Defaults to `kirin.json` in the current directory
    /// when present.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Disable colored output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Elaborate a JSON project description and resolve its supertypes.
    Resolve(ResolveArgs),
    /// Resolve a project and write one `.kirl` library per module.
    Pack(PackArgs),
    /// Link libraries and build fake overrides for the linked classes.
    Link(LinkArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Project description (JSON).
    pub project: PathBuf,

    /// Packages star-imported into every file (comma separated).
    #[arg(long = "default-imports", value_delimiter = ',')]
    pub default_imports: Option<Vec<String>>,

    /// Also build fake overrides and report how many were created.
    #[arg(long = "fake-overrides")]
    pub fake_overrides: bool,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Project description (JSON).
    pub project: PathBuf,

    /// Output directory for the libraries.
    #[arg(short = 'o', long = "out-dir")]
    pub out_dir: PathBuf,

    /// Packages star-imported into every file (comma separated).
    #[arg(long = "default-imports", value_delimiter = ',')]
    pub default_imports: Option<Vec<String>>,

    /// Pack even when supertype resolution reported errors.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Libraries to link, in any order.
    #[arg(required = true)]
    pub libraries: Vec<PathBuf>,

    /// Strategy for libraries not listed in `--export`.
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Libraries read whole (comma separated module names).
    #[arg(long = "export", value_delimiter = ',')]
    pub exported_dependencies: Option<Vec<String>>,

    /// Packages whose unowned classes become forward declarations.
    #[arg(long = "forward-declarations", value_delimiter = ',')]
    pub forward_declaration_packages: Option<Vec<String>>,

    /// Skip fake-override construction after linking.
    #[arg(long = "no-fake-overrides")]
    pub no_fake_overrides: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    #[value(name = "only-referenced")]
    OnlyReferenced,
    All,
    #[value(name = "explicitly-exported")]
    ExplicitlyExported,
    #[value(name = "headers")]
    OnlyDeclarationHeaders,
}

impl From<Strategy> for DeserializationStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::OnlyReferenced => DeserializationStrategy::OnlyReferenced,
            Strategy::All => DeserializationStrategy::All,
            Strategy::ExplicitlyExported => DeserializationStrategy::ExplicitlyExported,
            Strategy::OnlyDeclarationHeaders => DeserializationStrategy::OnlyDeclarationHeaders,
        }
    }
}
