//! `project` — parse, project, and verify a protocol module from the
//! command line (spec.md §6.2).

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use termcolor::{ColorChoice, StandardStream};

use mpst::ast::Span;
use mpst::config::PipelineConfig;
use mpst::pipeline;
use mpst::serialize;

#[derive(FromArgs)]
/// Project and verify a multiparty protocol module.
struct Args {
    /// protocol source file (omit with --stdin to read from standard input)
    #[argh(positional)]
    file: Option<PathBuf>,

    /// read source from standard input instead of a file
    #[argh(switch)]
    stdin: bool,

    /// only project this role (may be given once); default is every
    /// declared role of every protocol
    #[argh(option)]
    role: Vec<String>,

    /// directory to write per-role CFSM files into (default: current directory)
    #[argh(option, default = "PathBuf::from(\".\")")]
    output_dir: PathBuf,

    /// output format: text, json, or both (default: text)
    #[argh(option, default = "String::from(\"text\")")]
    format: String,

    /// accept the protocol even if verification reports fatal findings
    #[argh(switch)]
    skip_verification: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();

    let (source, file_name) = if args.stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading protocol source from stdin")?;
        (buf, "<stdin>".to_string())
    } else {
        let path = args.file.clone().ok_or_else(|| anyhow::anyhow!("a file argument or --stdin is required"))?;
        let source = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        (source, path.display().to_string())
    };

    let registry = match pipeline::parse(&source) {
        Ok(registry) => registry,
        Err(err) => {
            report_parse_error(&file_name, &source, &err);
            std::process::exit(1);
        }
    };

    let mut config = PipelineConfig::default();
    if args.skip_verification {
        config.fail_on_fatal = false;
    }

    fs::create_dir_all(&args.output_dir).context("creating output directory")?;

    let mut any_rejected = false;
    for protocol_name in registry.names().map(str::to_string).collect::<Vec<_>>() {
        tracing::info!(protocol = %protocol_name, "compiling protocol");
        let compiled = match pipeline::compile(&registry, &protocol_name, &config) {
            Ok(compiled) => compiled,
            Err(err) => {
                eprintln!("error: protocol `{protocol_name}` failed: {err}");
                any_rejected = true;
                continue;
            }
        };

        for finding in &compiled.report.findings {
            eprintln!("{protocol_name}: {finding}");
        }

        for (role, cfsm) in &compiled.cfsms {
            if !args.role.is_empty() && !args.role.iter().any(|r| r.as_str() == role.as_str()) {
                continue;
            }

            if args.format == "text" || args.format == "both" {
                println!("--- {protocol_name} / {role} ---");
                println!("states: {}, transitions: {}", cfsm.state_count(), cfsm.transition_count());
            }

            if args.format == "json" || args.format == "both" {
                let persisted = serialize::to_persisted(cfsm);
                let json = serde_json::to_string_pretty(&persisted).context("serializing CFSM")?;
                let out_path = args.output_dir.join(format!("{protocol_name}.{role}.json"));
                let mut file = fs::File::create(&out_path)
                    .with_context(|| format!("creating {}", out_path.display()))?;
                file.write_all(json.as_bytes())?;
            }
        }
    }

    if any_rejected {
        std::process::exit(1);
    }
    Ok(())
}

fn report_parse_error(file_name: &str, source: &str, err: &mpst::error::Error) {
    let mut files = SimpleFiles::new();
    let file_id = files.add(file_name, source);

    let span = parse_error_span(err);
    let diagnostic = Diagnostic::error()
        .with_message(err.to_string())
        .with_labels(vec![Label::primary(file_id, span.start..span.end)]);

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic);
}

fn parse_error_span(err: &mpst::error::Error) -> Span {
    match err {
        mpst::error::Error::Parse(mpst::parser::ParseError::Syntax { span, .. })
        | mpst::error::Error::Parse(mpst::parser::ParseError::UnboundRecursionLabel { span, .. })
        | mpst::error::Error::Parse(mpst::parser::ParseError::ShadowedRecursionLabel { span, .. })
        | mpst::error::Error::Parse(mpst::parser::ParseError::UnreachableAfterContinue { span })
        | mpst::error::Error::Parse(mpst::parser::ParseError::UndeclaredRole { span, .. }) => *span,
        _ => Span::synthetic(),
    }
}
