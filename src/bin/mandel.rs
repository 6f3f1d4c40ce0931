use std::io::Write;
use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use itertools::Itertools;
use num::Complex;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mandel::{observer_fn, render, BuildStats, Palette, RasterEngine, ViewConfig};

const PROGRESS_BAR_WIDTH: usize = 30;

fn parse_triple<T: FromStr>(s: &str, separator: char) -> Option<(T, T, T)> {
    let parts: Vec<&str> = s.split(separator).collect();
    if parts.len() != 3 {
        return None;
    }
    match (
        T::from_str(parts[0]),
        T::from_str(parts[1]),
        T::from_str(parts[2]),
    ) {
        (Ok(a), Ok(b), Ok(c)) => Some((a, b, c)),
        _ => None,
    }
}

fn validate_triple<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_triple::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const CONFIG: &str = "config";
const OUTPUT: &str = "output";
const THREADS: &str = "threads";
const ZOOM: &str = "zoom";
const VERBOSE: &str = "verbose";
const QUIET: &str = "quiet";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version("0.1.0")
        .about("Parallel escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(CONFIG)
                .required(true)
                .long(CONFIG)
                .short("c")
                .takes_value(true)
                .help("YAML view configuration"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output image; the format follows the extension"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of render threads (default: one per CPU)"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| {
                    validate_triple::<f64>(&s, ',', "Zoom must be given as RE,IM,FACTOR")
                })
                .help("Zoom into RE,IM by FACTOR before rendering"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .multiple(true)
                .help("Print a build summary; repeat for debug logging"),
        )
        .arg(
            Arg::with_name(QUIET)
                .long(QUIET)
                .short("q")
                .help("Do not draw the progress bar"),
        )
        .get_matches()
}

fn progress_bar(percentage: f64) -> String {
    let filled = ((PROGRESS_BAR_WIDTH as f64) * percentage / 100.0).ceil() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    let state = if percentage < 100.0 {
        "   [in progress] \r"
    } else {
        "   [done]  \n"
    };
    format!(
        "|{}{}| {:.1}%{}",
        "#".repeat(filled),
        " ".repeat(PROGRESS_BAR_WIDTH - filled),
        percentage,
        state
    )
}

fn log_level(verbosity: u64) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn complex_string(c: Complex<f64>) -> String {
    format!("{}{}{}i", c.re, if c.im >= 0.0 { "+" } else { "" }, c.im)
}

fn summary(view: &ViewConfig, output: &str, stats: &BuildStats) {
    println!("> output file: {}", output);
    println!("> configurations:");
    println!("   - picture dimension: {}x{}", view.width(), view.height());
    println!(
        "   - min complex number: {}",
        complex_string(Complex::new(view.min_re(), view.min_im()))
    );
    println!(
        "   - max complex number: {}",
        complex_string(Complex::new(view.max_re(), view.max_im()))
    );
    println!("   - max iterations: {}", view.max_iterations());
    println!("   - set color: {:#08x}", view.in_set_color());
    println!(
        "   - color gradient: [{}]",
        view.gradient().iter().map(|c| format!("{:#08x}", c)).join(", ")
    );
    println!("> build information:");
    println!("   - build time: {:.3}s", stats.elapsed.as_secs_f64());
    println!("   - total number of iterations: {}", stats.total_iterations);
    println!(
        "   - average number of iterations per pixel: {:.2}",
        stats.average_iterations()
    );
    println!("   - pixels in the set: {}", stats.in_set);
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let output = matches.value_of(OUTPUT).unwrap_or_default();
    let mut view = ViewConfig::from_yaml_file(matches.value_of(CONFIG).unwrap_or_default())?;

    if let Some((re, im, factor)) = matches
        .value_of(ZOOM)
        .and_then(|s| parse_triple::<f64>(s, ','))
    {
        view = view.zoomed(Complex::new(re, im), factor)?;
        info!(re, im, factor, "zoomed view");
    }

    let engine = match matches.value_of(THREADS) {
        Some(t) => RasterEngine::with_threads(usize::from_str(t)?),
        None => RasterEngine::new(),
    };
    info!(threads = engine.threads(), "rendering {}", output);

    let verbose = matches.occurrences_of(VERBOSE) > 0;
    let quiet = matches.is_present(QUIET);
    let mut stats = None;
    let buffer = {
        let mut observer = observer_fn(
            |percentage| {
                if !quiet {
                    print!("{}", progress_bar(percentage));
                    let _ = std::io::stdout().flush();
                }
            },
            |s: &BuildStats| stats = Some(s.clone()),
        );
        engine.build_with(&view, &mut observer)?
    };

    let palette = Palette::new(&view)?;
    render(&buffer, &palette)?.save(output)?;

    match stats {
        Some(ref stats) if verbose => summary(&view, output, stats),
        _ => println!("> output: {}", output),
    }
    Ok(())
}

fn main() {
    let matches = args();

    // RUST_LOG, when set, takes precedence over -v.
    let level = log_level(matches.occurrences_of(VERBOSE));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install logger: {}", e);
    }

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
