// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use spectree_metadata::{OutcomeStatus, SpectreeExitCode};
use spectree_runner::{
    OutputFormat, SerializableFormat,
    batcher::{ChangeBatch, ChangeBatcher},
    config::SpectreeConfig,
    errors::WriteOutputError,
    reconcile::{junit_report, reconcile_store, write_junit, write_reconciliations},
    scanner::Scanner,
    tags::{TagRegistry, TagStore},
    tree::TreeStore,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Discover describe/it test trees in source files and reconcile run results against them.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct SpectreeApp {
    /// Config file [default: .config/spectree.toml in the current directory]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the suites and tests declared in source files
    List {
        #[clap(flatten)]
        format: MessageFormatOpts,

        /// Source files to scan
        #[arg(required = true, value_name = "FILES")]
        files: Vec<Utf8PathBuf>,
    },

    /// Match a results payload against the tests declared in source files
    ///
    /// The payload is the JSON produced by the test process: either an array of records, or a
    /// mocha-style report with `tests` and `pending` arrays.
    Reconcile {
        /// Path to the results payload
        #[arg(long, value_name = "PATH")]
        results: Utf8PathBuf,

        /// Exit code of the test process
        ///
        /// If the payload can't be parsed and this is 0, every test is reported as passed.
        #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
        exit_code: Option<i32>,

        /// Also write a JUnit report to this path
        #[arg(long, value_name = "PATH")]
        junit: Option<Utf8PathBuf>,

        #[clap(flatten)]
        format: MessageFormatOpts,

        /// Source files the results were produced from
        #[arg(required = true, value_name = "FILES")]
        files: Vec<Utf8PathBuf>,
    },

    /// Rescan source files as they change
    ///
    /// Changed paths are read from standard input, one per line. Changes are batched, and
    /// each batch is rescanned and printed once no further changes arrive for the configured
    /// debounce period.
    Watch {
        /// Source files to scan initially
        #[arg(value_name = "FILES")]
        files: Vec<Utf8PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Args)]
struct MessageFormatOpts {
    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,
}

impl MessageFormatOpts {
    fn to_output_format(self, verbose: bool) -> OutputFormat {
        match self.message_format {
            MessageFormat::Human => OutputFormat::Human { verbose },
            MessageFormat::Json => OutputFormat::Serializable(SerializableFormat::Json),
            MessageFormat::JsonPretty => OutputFormat::Serializable(SerializableFormat::JsonPretty),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// A human-readable output format
    #[default]
    Human,
    /// JSON with no whitespace
    Json,
    /// JSON, prettified
    JsonPretty,
}

impl SpectreeApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config =
            SpectreeConfig::from_sources(Utf8Path::new("."), self.config_file.as_deref())?;
        let registry = TagRegistry::new();
        let scanner = Scanner::new(&config.discovery, &registry);

        match self.command {
            Command::List { format, files } => {
                let store = scan_files(&scanner, &files);
                let mut writer = output_writer.stdout_writer();
                store.write(
                    format.to_output_format(output.verbose),
                    &mut writer,
                    output.colorize_stdout(),
                )?;
                writer.flush().map_err(WriteOutputError::Io)?;
                Ok(SpectreeExitCode::OK)
            }
            Command::Reconcile {
                results,
                exit_code,
                junit,
                format,
                files,
            } => {
                let raw = std::fs::read_to_string(&results).map_err(|err| {
                    ExpectedError::ResultsReadFailed {
                        path: results.clone(),
                        err,
                    }
                })?;
                let overall_success = exit_code.map(|code| code == 0);

                let mut store = scan_files(&scanner, &files);
                let reconciliations = reconcile_store(&mut store, &raw, overall_success);

                let mut writer = output_writer.stdout_writer();
                write_reconciliations(
                    &reconciliations,
                    format.to_output_format(output.verbose),
                    &mut writer,
                    output.colorize_stdout(),
                )?;
                writer.flush().map_err(WriteOutputError::Io)?;

                if let Some(path) = junit {
                    let report = junit_report(&config.junit.report_name, &reconciliations);
                    write_junit(&report, &path)?;
                    debug!("wrote JUnit report to {path}");
                }

                let test_count: usize = store.iter().map(|tree| tree.test_count()).sum();
                let failed: usize = reconciliations
                    .iter()
                    .map(|result| result.count(OutcomeStatus::Failed))
                    .sum();
                if test_count == 0 {
                    Err(ExpectedError::NoTestsFound)
                } else if failed > 0 {
                    Err(ExpectedError::TestsFailed { failed })
                } else {
                    Ok(SpectreeExitCode::OK)
                }
            }
            Command::Watch { files } => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|err| ExpectedError::RuntimeCreateFailed { err })?;
                let mut store = scan_files(&scanner, &files);
                let watcher = Watcher {
                    scanner: &scanner,
                    output,
                };
                let result = runtime.block_on(watcher.run(
                    &mut store,
                    config.watch.debounce,
                    output_writer,
                ));
                // Reading stdin blocks a runtime thread that can't be interrupted.
                runtime.shutdown_background();
                result
            }
        }
    }
}

fn scan_files<S: TagStore>(scanner: &Scanner<S>, files: &[Utf8PathBuf]) -> TreeStore {
    let mut store = TreeStore::new();
    for file in files {
        store.rescan_path(scanner, file);
    }
    debug!(
        "scanned {} files, found {} tests",
        store.len(),
        store.iter().map(|tree| tree.test_count()).sum::<usize>()
    );
    store
}

struct Watcher<'a, S> {
    scanner: &'a Scanner<S>,
    output: OutputContext,
}

impl<S: TagStore> Watcher<'_, S> {
    async fn run(
        &self,
        store: &mut TreeStore,
        debounce: std::time::Duration,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let format = OutputFormat::Human {
            verbose: self.output.verbose,
        };
        {
            let mut writer = output_writer.stdout_writer();
            store.write(format, &mut writer, self.output.colorize_stdout())?;
            writer.flush().map_err(WriteOutputError::Io)?;
        }

        let (batcher, mut batches) = ChangeBatcher::spawn(debounce);
        // Set to None once stdin is closed or the user interrupts, which ends the batcher.
        let mut batcher = Some(batcher);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!("watching for changes, reading changed paths from stdin");

        loop {
            tokio::select! {
                line = lines.next_line(), if batcher.is_some() => {
                    let line = line.map_err(|err| ExpectedError::StdinReadFailed { err })?;
                    match line {
                        Some(line) => {
                            let path = line.trim();
                            if let Some(handle) = &batcher
                                && !path.is_empty()
                            {
                                handle.notify(path);
                            }
                        }
                        None => {
                            debug!("stdin closed, flushing pending changes");
                            batcher = None;
                        }
                    }
                }
                result = &mut ctrl_c, if batcher.is_some() => {
                    result.map_err(|err| ExpectedError::SignalHandlerSetupError { err })?;
                    info!("interrupted, discarding pending changes");
                    if let Some(handle) = batcher.take() {
                        handle.cancel();
                    }
                }
                batch = batches.recv() => {
                    let Some(batch) = batch else {
                        break;
                    };
                    self.apply_batch(store, batch, output_writer)?;
                }
            }
        }

        Ok(SpectreeExitCode::OK)
    }

    fn apply_batch(
        &self,
        store: &mut TreeStore,
        batch: ChangeBatch,
        output_writer: &mut OutputWriter,
    ) -> Result<()> {
        debug!("rescanning {} changed files", batch.paths.len());
        let mut writer = output_writer.stdout_writer();
        for path in &batch.paths {
            let tree = store.rescan_path(self.scanner, path);
            tree.write_human(&mut writer, true, self.output.colorize_stdout())
                .map_err(WriteOutputError::Io)?;
        }
        writer.flush().map_err(WriteOutputError::Io)?;
        Ok(())
    }
}
