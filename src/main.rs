//! CLI entry point for `formwire`.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use formwire::config::Config;
use formwire::image::{self, MIN_SNIFF_LEN};
use formwire::multipart::{self, file_field, PAYLOAD_FIELD};
use formwire::{File, ImageFormat};

#[derive(Parser)]
#[command(
    name = "formwire",
    version,
    about = "Sniff images, encode data URIs, and build multipart/form-data bodies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the image type of one or more files
    Sniff {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print an image file as a data URI, or decode one with --decode
    DataUri {
        #[arg(required_unless_present = "decode")]
        path: Option<PathBuf>,
        /// Data URI to decode instead of encoding a file
        #[arg(long, conflicts_with = "path", requires = "output")]
        decode: Option<String>,
        /// Where to write decoded bytes. A directory gets `decoded.<ext>` inside it.
        #[arg(short, long, requires = "decode")]
        output: Option<PathBuf>,
    },
    /// Build a multipart/form-data body from a JSON payload and files
    Build {
        /// Inline JSON payload (default: `{}`)
        #[arg(long, conflicts_with = "payload_file")]
        payload: Option<String>,
        /// Read the JSON payload from a file
        #[arg(long, value_name = "PATH")]
        payload_file: Option<PathBuf>,
        /// Attachment: PATH[;type=CONTENT_TYPE][;filename=NAME]. Repeatable, order is kept.
        #[arg(short, long = "file", value_name = "SPEC")]
        files: Vec<String>,
        /// Where to write the body
        #[arg(short, long)]
        output: PathBuf,
        /// Fixed boundary instead of a random one
        #[arg(long)]
        boundary: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = formwire::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Sniff { files, json } => cmd_sniff(&files, json, &config),
        Commands::DataUri {
            path,
            decode,
            output,
        } => match (decode, output) {
            (Some(uri), Some(output)) => cmd_decode_data_uri(&uri, &output),
            _ => match path {
                Some(path) => cmd_data_uri(&path, &config),
                None => anyhow::bail!("either a file or --decode is required"),
            },
        },
        Commands::Build {
            payload,
            payload_file,
            files,
            output,
            boundary,
            json,
        } => {
            let payload = load_payload(payload.as_deref(), payload_file.as_deref())?;
            cmd_build(&payload, &files, &output, boundary.as_deref(), json, &config)
        }
        Commands::Config { save } => cmd_config(save, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = formwire::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "formwire.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "formwire", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print the config file location and the effective configuration.
fn cmd_config(save: bool, config: &Config) -> anyhow::Result<()> {
    if save {
        formwire::config::save_config(config)?;
    }
    match formwire::config::config_file_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config directory available)"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Classify each file from its first bytes.
fn cmd_sniff(files: &[PathBuf], json: bool, config: &Config) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let mime = sniff_path(path)?;
        results.push((path, mime));
    }

    if json {
        let items: Vec<serde_json::Value> = results
            .iter()
            .map(|(path, mime)| {
                serde_json::json!({
                    "file": path.to_string_lossy(),
                    "mime_type": mime,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(items), config)?;
    } else {
        for (path, mime) in &results {
            println!("{}: {}", path.display(), mime.unwrap_or("unsupported"));
        }
    }
    Ok(())
}

/// Read at most [`MIN_SNIFF_LEN`] bytes of `path` and classify them.
fn sniff_path(path: &Path) -> anyhow::Result<Option<&'static str>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut head = Vec::with_capacity(MIN_SNIFF_LEN);
    file.take(MIN_SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(image::image_mime_type(&head).ok())
}

/// Print an image file as a data URI.
fn cmd_data_uri(path: &Path, config: &Config) -> anyhow::Result<()> {
    check_size(path, config)?;
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let uri = image::to_data_uri(&data).with_context(|| path.display().to_string())?;
    println!("{uri}");
    Ok(())
}

/// Decode a data URI and write its bytes to `output`.
fn cmd_decode_data_uri(uri: &str, output: &Path) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let (format, data) = image::parse_data_uri(uri.trim())?;
    let output = decoded_output_path(output, format);
    std::fs::write(&output, &data).with_context(|| format!("writing {}", output.display()))?;
    eprintln!(
        "  Wrote {} ({}) to {}",
        format,
        format_size(data.len() as u64, BINARY),
        output.display()
    );
    Ok(())
}

/// Resolve the `--decode` target: a directory gets `decoded.<ext>` inside it.
fn decoded_output_path(output: &Path, format: ImageFormat) -> PathBuf {
    if output.is_dir() {
        output.join(format!("decoded.{}", format.extension()))
    } else {
        output.to_path_buf()
    }
}

/// Parse the payload argument(s) into a JSON value.
fn load_payload(inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading payload {}", path.display()))?,
        (None, None) => return Ok(serde_json::json!({})),
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

/// One `--file` argument: `PATH[;type=CONTENT_TYPE][;filename=NAME]`.
#[derive(Debug, PartialEq)]
struct AttachmentSpec {
    path: PathBuf,
    content_type: Option<String>,
    filename: Option<String>,
}

impl AttachmentSpec {
    fn parse(spec: &str) -> anyhow::Result<Self> {
        let mut segments = spec.split(';');
        let path = segments.next().unwrap_or_default().trim();
        if path.is_empty() {
            anyhow::bail!("attachment '{spec}' has no path");
        }

        let mut parsed = Self {
            path: PathBuf::from(path),
            content_type: None,
            filename: None,
        };
        for segment in segments {
            match segment.split_once('=') {
                Some(("type", value)) => parsed.content_type = Some(value.trim().to_string()),
                Some(("filename", value)) => parsed.filename = Some(value.to_string()),
                _ => anyhow::bail!("unknown attachment option '{segment}' in '{spec}'"),
            }
        }
        Ok(parsed)
    }

    /// Name sent in the part's `filename` parameter.
    fn display_name(&self) -> String {
        self.filename.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
        })
    }
}

/// Reject files larger than the configured attachment limit.
fn check_size(path: &Path, config: &Config) -> anyhow::Result<u64> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("file not found: {}", path.display()))?
        .len();
    if size > config.upload.max_file_size {
        anyhow::bail!(
            "{} is {} bytes, above the {} byte limit (upload.max_file_size)",
            path.display(),
            size,
            config.upload.max_file_size
        );
    }
    Ok(size)
}

/// Build a multipart body and write it to `output`.
fn cmd_build(
    payload: &serde_json::Value,
    specs: &[String],
    output: &Path,
    boundary: Option<&str>,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let specs = specs
        .iter()
        .map(|s| AttachmentSpec::parse(s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Resolve names and content types, and check sizes, before opening anything.
    let mut total_bytes = 0u64;
    let mut parts = Vec::with_capacity(specs.len());
    for spec in &specs {
        total_bytes += check_size(&spec.path, config)?;
        let content_type = match &spec.content_type {
            Some(ct) => ct.clone(),
            None if config.upload.sniff_images => {
                sniff_path(&spec.path)?.unwrap_or_default().to_string()
            }
            None => String::new(),
        };
        parts.push((spec.display_name(), content_type));
    }

    // The handles stay owned here; the builder only borrows them.
    let mut handles = specs
        .iter()
        .map(|spec| {
            std::fs::File::open(&spec.path)
                .with_context(|| format!("opening {}", spec.path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let pb = ProgressBar::new(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Building [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let files: Vec<File<'_>> = handles
        .iter_mut()
        .zip(&parts)
        .map(|(handle, (name, content_type))| {
            let reader = BufReader::with_capacity(config.upload.read_buffer_size, handle);
            File::new(name.clone(), pb.wrap_read(reader)).with_content_type(content_type.clone())
        })
        .collect();

    let form = match boundary {
        Some(b) => multipart::build_body_with_boundary(payload, files, b),
        None => multipart::build_body(payload, files),
    };
    pb.finish_and_clear();
    let form = form?;
    let boundary = form.boundary().map(str::to_string);
    let (content_type, body) = form.into_parts();

    std::fs::write(output, &body).with_context(|| format!("writing {}", output.display()))?;

    if json {
        let mut part_list = vec![serde_json::json!({
            "field": PAYLOAD_FIELD,
            "content_type": multipart::body::PAYLOAD_CONTENT_TYPE,
        })];
        for (index, (name, content_type)) in parts.iter().enumerate() {
            part_list.push(serde_json::json!({
                "field": file_field(index),
                "filename": name,
                "content_type": if content_type.is_empty() {
                    formwire::model::file::DEFAULT_CONTENT_TYPE
                } else {
                    content_type.as_str()
                },
            }));
        }
        let report = serde_json::json!({
            "output": output.to_string_lossy(),
            "content_type": content_type,
            "boundary": boundary,
            "size": body.len(),
            "parts": part_list,
        });
        print_json(&report, config)?;
    } else {
        println!("{content_type}");
        eprintln!(
            "  Wrote {} part(s), {} to {}",
            parts.len() + 1,
            format_size(body.len() as u64, BINARY),
            output.display()
        );
    }

    Ok(())
}

fn print_json(value: &serde_json::Value, config: &Config) -> anyhow::Result<()> {
    if config.output.pretty_json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_spec_path_only() {
        let spec = AttachmentSpec::parse("images/cat.png").unwrap();
        assert_eq!(spec.path, PathBuf::from("images/cat.png"));
        assert_eq!(spec.content_type, None);
        assert_eq!(spec.display_name(), "cat.png");
    }

    #[test]
    fn test_attachment_spec_options() {
        let spec = AttachmentSpec::parse("a.bin;type=image/png;filename=x\"y.png").unwrap();
        assert_eq!(spec.content_type.as_deref(), Some("image/png"));
        assert_eq!(spec.display_name(), "x\"y.png");
    }

    #[test]
    fn test_attachment_spec_rejects_unknown_option() {
        assert!(AttachmentSpec::parse("a.bin;color=red").is_err());
        assert!(AttachmentSpec::parse(";type=image/png").is_err());
    }

    #[test]
    fn test_load_payload_default_and_inline() {
        assert_eq!(load_payload(None, None).unwrap(), serde_json::json!({}));
        assert_eq!(
            load_payload(Some(r#"{"content":"hi"}"#), None).unwrap(),
            serde_json::json!({"content": "hi"})
        );
        assert!(load_payload(Some("{not json"), None).is_err());
    }

    #[test]
    fn test_decoded_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            decoded_output_path(dir.path(), ImageFormat::Jpeg),
            dir.path().join("decoded.jpg")
        );
        let file = dir.path().join("out.bin");
        assert_eq!(decoded_output_path(&file, ImageFormat::Png), file);
    }

    #[test]
    fn test_output_requires_decode() {
        let encode = ["formwire", "data-uri", "a.png", "-o", "out.txt"];
        assert!(Cli::try_parse_from(encode).is_err());
        let decode = ["formwire", "data-uri", "--decode", "data:,", "-o", "out.png"];
        assert!(Cli::try_parse_from(decode).is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
