use argp::FromArgs;

/// Top-level command
#[derive(FromArgs, PartialEq, Eq, Debug)]
#[argp(description = "Identify files by their contents.")]
pub struct Sniff {
    #[argp(option, short = 'v', global, default = "0")]
    #[argp(description = "Logging level (0 = Off, 1 = Error, 2 = Warn, 3 = Info, 4 = Debug, 5 = Trace)")]
    pub verbose: usize,

    #[argp(subcommand)]
    pub nested: Modules,
}

/// These are all the commands that sniff supports.
#[derive(FromArgs, PartialEq, Eq, Debug)]
#[argp(subcommand)]
#[non_exhaustive]
pub enum Modules {
    IdentifyFile(IdentifyOption),
    ListRules(RulesOption),
}

/// Command to try to identify what a given file is.
#[derive(FromArgs, PartialEq, Eq, Debug)]
#[argp(subcommand, name = "info")]
#[argp(description = "Identify a file and print relevant information")]
pub struct IdentifyOption {
    #[argp(switch, long = "all")]
    #[argp(description = "Print every matching rule instead of only the first.")]
    pub all: bool,

    #[argp(positional)]
    #[argp(description = "Input file to be processed")]
    pub input: String,
}

/// Command to dump the compiled-in rules.
#[derive(FromArgs, PartialEq, Eq, Debug)]
#[argp(subcommand, name = "rules")]
#[argp(description = "Print the compiled-in rule trees")]
pub struct RulesOption {}
