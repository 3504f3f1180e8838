use anyhow::Result;
use log::LevelFilter;
use mimalloc::MiMalloc;

mod identify;
mod menu;
use menu::{Modules, Sniff};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let args: Sniff = argp::parse_args_or_exit(argp::DEFAULT);

    env_logger::Builder::new().filter_level(level_filter(args.verbose)).init();

    let rules = sniff_magic::builtin::rules()?;
    log::debug!("Loaded {} compiled-in rule trees", rules.len());

    match args.nested {
        Modules::IdentifyFile(params) => identify::identify_file(&rules, &params.input, params.all),
        Modules::ListRules(_) => {
            identify::print_rules(&rules);
            Ok(())
        }
    }
}
