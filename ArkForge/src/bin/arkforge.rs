//! `arkforge` command-line entry point

fn main() -> anyhow::Result<()> {
    arkforge::cli::run_cli()
}
