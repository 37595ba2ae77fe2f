//! Command-line front end: read a file (or stdin), write one LZ4 frame.
//!
//! The library does all the work; this is argument handling, file plumbing
//! and the obligatory refusal to overwrite things without `-f`.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use lz_oracle::CompressionSettings;

#[derive(Debug)]
struct Options {
    level: u8,
    force: bool,
    verbose: bool,
    show_help: bool,
    dictionary: Option<String>,
    /// `None` or `-` means the standard stream.
    input: Option<String>,
    output: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            level: 9,
            force: false,
            verbose: false,
            show_help: false,
            dictionary: None,
            input: None,
            output: None,
        }
    }
}

fn usage(program: &str) -> String {
    format!(
        "usage: {} [options] [input] [output]\n\
         \n\
         Compress input (default: stdin) into an LZ4 frame (default: stdout).\n\
         A lone dash means the standard stream.\n\
         \n\
         options:\n\
         \x20 -0 ... -9  compression level: 0 stores, 9 tries hardest (default)\n\
         \x20 -f         overwrite the output file if it exists\n\
         \x20 -D FILE    preload FILE's trailing 64 KiB as a dictionary\n\
         \x20 -v         report sizes and ratio on stderr\n\
         \x20 -h         show this help",
        program
    )
}

/// Parse `argv` (without the program name). Kept free of `std::env` so the
/// tests can feed it argument lists directly.
fn parse_args(argv: &[String]) -> Result<Options> {
    let mut opts = Options::default();
    let mut positionals = Vec::new();

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            // a lone dash names a standard stream, not an option
            "-" => positionals.push(arg.clone()),
            "-h" => opts.show_help = true,
            "-f" => opts.force = true,
            "-v" => opts.verbose = true,
            "-D" => {
                let file = iter.next().context("option -D requires a dictionary file")?;
                opts.dictionary = Some(file.clone());
            }
            flag if flag.len() == 2
                && flag.starts_with('-')
                && flag.as_bytes()[1].is_ascii_digit() =>
            {
                opts.level = flag.as_bytes()[1] - b'0';
            }
            flag if flag.starts_with('-') => bail!("unknown option {}", flag),
            _ => positionals.push(arg.clone()),
        }
    }

    if positionals.len() > 2 {
        bail!("too many arguments: expected at most an input and an output path");
    }
    opts.input = positionals.first().cloned();
    opts.output = positionals.get(1).cloned();
    Ok(opts)
}

fn run(opts: &Options) -> Result<()> {
    let input = match opts.input.as_deref() {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
        Some(path) => fs::read(path).with_context(|| format!("cannot read {}", path))?,
    };

    let dictionary = match opts.dictionary.as_deref() {
        Some(path) => {
            Some(fs::read(path).with_context(|| format!("cannot read dictionary {}", path))?)
        }
        None => None,
    };

    let mut settings = CompressionSettings::default();
    settings.level(opts.level);
    if let Some(dict) = dictionary.as_deref() {
        settings.dictionary(dict);
    }
    let frame = settings.compress_to_vec(&input);

    match opts.output.as_deref() {
        None | Some("-") => {
            io::stdout()
                .lock()
                .write_all(&frame)
                .context("cannot write stdout")?;
        }
        Some(path) => {
            if !opts.force && Path::new(path).exists() {
                bail!("{} already exists; use -f to overwrite", path);
            }
            fs::write(path, &frame).with_context(|| format!("cannot write {}", path))?;
        }
    }

    if opts.verbose {
        let ratio = if input.is_empty() {
            100.0
        } else {
            frame.len() as f64 * 100.0 / input.len() as f64
        };
        eprintln!("{} -> {} bytes ({:.2}%)", input.len(), frame.len(), ratio);
    }

    Ok(())
}

fn main() {
    let program = env::args().next().unwrap_or_else(|| "lz-oracle".into());
    let argv: Vec<String> = env::args().skip(1).collect();

    let result = parse_args(&argv).and_then(|opts| {
        if opts.show_help {
            println!("{}", usage(&program));
            return Ok(());
        }
        run(&opts)
    });

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        parse_args(&args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn defaults() {
        let opts = parse(&[]).unwrap();
        assert_eq!(opts.level, 9);
        assert!(!opts.force && !opts.verbose && !opts.show_help);
        assert!(opts.input.is_none() && opts.output.is_none());
    }

    #[test]
    fn levels_and_files() {
        let opts = parse(&["-3", "in.bin", "out.lz4"]).unwrap();
        assert_eq!(opts.level, 3);
        assert_eq!(opts.input.as_deref(), Some("in.bin"));
        assert_eq!(opts.output.as_deref(), Some("out.lz4"));
    }

    #[test]
    fn dash_is_a_stream_not_a_flag() {
        let opts = parse(&["-", "out.lz4"]).unwrap();
        assert_eq!(opts.input.as_deref(), Some("-"));
        assert_eq!(opts.output.as_deref(), Some("out.lz4"));
    }

    #[test]
    fn dictionary_takes_a_value() {
        let opts = parse(&["-D", "dict.bin", "-9"]).unwrap();
        assert_eq!(opts.dictionary.as_deref(), Some("dict.bin"));
        assert_eq!(opts.level, 9);
        assert!(parse(&["-D"]).is_err());
    }

    #[test]
    fn junk_is_rejected() {
        assert!(parse(&["-x"]).is_err());
        assert!(parse(&["--level"]).is_err());
        assert!(parse(&["a", "b", "c"]).is_err());
    }
}
