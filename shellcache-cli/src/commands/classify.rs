//! Classify command - show which class and policy a request gets.

use anyhow::Result;
use clap::Args;
use shellcache_core::{Method, Request, RequestMode};
use shellcache_fetch::Classifier;

use super::load_engine_config;
use crate::output::{JsonFormatter, TextFormatter, classify_to_output};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the classify command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// URLs to classify (relative paths resolve against the origin).
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Request method.
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: Method,

    /// Classify as document navigations.
    #[arg(long)]
    pub navigate: bool,
}

/// Runs the classify command.
pub async fn run(args: &ClassifyArgs, cli: &Cli) -> Result<ExitCode> {
    let config = load_engine_config(cli).await?;
    let classifier = Classifier::from_config(&config);
    let mode = if args.navigate {
        RequestMode::Navigate
    } else {
        RequestMode::default()
    };

    let mut outputs = Vec::with_capacity(args.urls.len());
    for raw in &args.urls {
        let url = config.resolve(raw)?;
        let request = Request::new(args.method.clone(), url.clone()).with_mode(mode);
        outputs.push(classify_to_output(url.as_str(), classifier.classify(&request)));
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            for output in &outputs {
                println!("{}", formatter.format_class_line(&output.url, output.class));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&outputs)?);
        }
    }

    Ok(ExitCode::Success)
}
