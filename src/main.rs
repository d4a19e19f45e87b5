//! HMICB CLI - Convert animation scripts into frame containers.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use hmicb::{EncoderConfig, OutputFormat, convert_script, decode_script_input};

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    script: PathBuf,
    config: Option<PathBuf>,
    format: Option<OutputFormat>,
    keyframe_interval: Option<u32>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut script = None;
    let mut rest = args.iter().skip(1);

    while let Some(arg) = rest.next() {
        let mut value = |flag: &str| {
            rest.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--format" => {
                let v = value("--format")?;
                parsed.format = Some(v.parse::<OutputFormat>().map_err(|e| e.to_string())?);
            }
            "--keyframe-interval" => {
                let v = value("--keyframe-interval")?;
                parsed.keyframe_interval = Some(
                    v.parse()
                        .map_err(|_| format!("invalid keyframe interval '{v}'"))?,
                );
            }
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path if script.is_none() => script = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument '{extra}'")),
        }
    }

    parsed.script = script.ok_or("missing script path")?;
    Ok(parsed)
}

/// Encoder config from the optional JSON file, with flags applied on top.
fn load_config(args: &Args) -> Result<EncoderConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Error reading config file: {e}"))?;
            serde_json::from_str(&text).map_err(|e| format!("Error parsing config: {e}"))?
        }
        None => EncoderConfig::default(),
    };
    if let Some(format) = args.format {
        config.output = format;
    }
    if let Some(interval) = args.keyframe_interval {
        config.keyframe_interval = interval;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// `.hmic7` inputs carry compressed script text.
fn is_compressed_input(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hmic7"))
}

/// Container and compressed artifact paths next to the script.
fn output_paths(script: &Path) -> (PathBuf, PathBuf) {
    (script.with_extension("hmicb"), script.with_extension("hmicb7"))
}

/// Write `bytes` to a temporary file beside `path`, then move it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Convert one script and write its artifacts. Returns the written paths.
fn run(args: &Args, config: &EncoderConfig) -> hmicb::Result<Vec<(PathBuf, usize)>> {
    let raw = fs::read(&args.script)?;
    let text = decode_script_input(&raw, is_compressed_input(&args.script))?;

    let start = Instant::now();
    let conversion = convert_script(&text, config)?;
    let elapsed = start.elapsed();

    let settings = &conversion.settings;
    println!("HMICB Encoder");
    println!("=============");
    println!("Script: {}", args.script.display());
    println!(
        "Canvas: {}x{} @ {} fps, {} frames{}",
        settings.width,
        settings.height,
        settings.fps,
        settings.frame_count,
        if settings.looping { ", looping" } else { "" }
    );
    println!("Commands: {}", conversion.command_count);
    println!(
        "Pixels drawn: {} ({} off-canvas skipped)",
        conversion.render_stats.pixels_drawn, conversion.render_stats.pixels_out_of_bounds
    );
    println!("Encoding: {}", conversion.encode_stats);
    println!();

    let (container_path, compressed_path) = output_paths(&args.script);
    let mut written = Vec::new();
    if config.output.wants_container() {
        write_atomic(&container_path, &conversion.container)?;
        written.push((container_path, conversion.container.len()));
    }
    if let Some(compressed) = &conversion.compressed {
        write_atomic(&compressed_path, compressed)?;
        written.push((compressed_path, compressed.len()));
    }

    for (path, size) in &written {
        println!("Wrote {} ({} bytes)", path.display(), size);
    }
    println!("Time: {:.3}s", elapsed.as_secs_f32());
    Ok(written)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <script> [options]");
    eprintln!();
    eprintln!("Convert an HMIC animation script into an HMICB container.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  script                   Script file (.hmic, or LZ4-compressed .hmic7)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --format <fmt>           container | compressed | both (default: both)");
    eprintln!("  --keyframe-interval <n>  Store every nth frame in full (default: 10)");
    eprintln!("  --config <file.json>     Encoder configuration; flags override it");
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    let program = argv.first().map(String::as_str).unwrap_or("hmicb");

    let args = parse_args(&argv).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!();
        print_usage(program);
        std::process::exit(1);
    });

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    if let Err(e) = run(&args, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
