use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    let args = ledger_move_import::args::parse();
    ledger_move_import::cli::main(args)
}
