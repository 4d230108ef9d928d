//! DeepSCF command-line interface.

use color_eyre::eyre::Result;
use deepscf::app::DeepScfApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    DeepScfApplication::from_cli()?.run()
}
