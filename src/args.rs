//! Command-line interface of the `cauchy` tool

use clap::{value_parser, Arg, ArgAction, Command};

/// Suffix joining an object's name to a fragment index
pub const FRAGMENT_SUFFIX: &str = ".frag.";

fn coding_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("k")
                .short('k')
                .long("data")
                .help("Number of data fragments")
                .value_name("K")
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("m")
                .short('m')
                .long("parity")
                .help("Number of parity fragments")
                .value_name("M")
                .value_parser(value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("w")
                .short('w')
                .long("word-size")
                .help("Galois field word size in bits")
                .value_name("W")
                .value_parser(value_parser!(usize))
                .default_value("8"),
        )
}

fn fragment_inputs() -> Arg {
    Arg::new("fragments")
        .help("Fragment files named <object>.frag.<index>")
        .required(true)
        .num_args(1..)
}

/// Build the full command tree
pub fn build_cli() -> Command {
    Command::new("cauchy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cauchy Reed-Solomon erasure coding of files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            coding_args(Command::new("encode").visible_alias("e"))
                .about("Split files into data and parity fragments")
                .arg(
                    Arg::new("files")
                        .help("Files to encode")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("threads")
                        .short('t')
                        .long("threads")
                        .help("Number of CPU threads for computation (0 = auto-detect)")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("no-parallel")
                        .long("no-parallel")
                        .help("Encode one file at a time")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            coding_args(Command::new("decode").visible_alias("d"))
                .about("Rebuild a file from any k of its fragments")
                .arg(
                    Arg::new("size")
                        .short('s')
                        .long("size")
                        .help("Length of the original file in bytes")
                        .value_name("BYTES")
                        .value_parser(value_parser!(usize))
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Where to write the rebuilt file")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(fragment_inputs()),
        )
        .subcommand(
            coding_args(Command::new("repair").visible_alias("r"))
                .about("Regenerate lost fragments from any k survivors")
                .arg(
                    Arg::new("base")
                        .short('b')
                        .long("base")
                        .help("Path prefix for repaired fragments (default: the prefix all survivors share)")
                        .value_name("PREFIX"),
                )
                .arg(
                    Arg::new("index")
                        .short('i')
                        .long("index")
                        .help("Index of a fragment to regenerate")
                        .value_name("I")
                        .value_parser(value_parser!(usize))
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(fragment_inputs()),
        )
}

pub fn parse_args() -> clap::ArgMatches {
    build_cli().get_matches()
}

/// Path of fragment `index` of the object at `base`
pub fn fragment_path(base: &str, index: usize) -> String {
    format!("{base}{FRAGMENT_SUFFIX}{index}")
}

/// Split `<base>.frag.<index>` into its base and index
pub fn split_fragment_path(path: &str) -> Option<(&str, usize)> {
    let (base, index) = path.rsplit_once(FRAGMENT_SUFFIX)?;
    Some((base, index.parse().ok()?))
}
