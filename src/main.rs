use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pseudolab::config::DEFAULT_CONFIG_FILE;
use pseudolab::{
    DemoConfig, DemoError, IterationOutcome, LoopController, PaletteClassifier, PixelEmbedder,
    PseudoLabeler, RotationSession, logging,
};

#[derive(Parser)]
#[command(name = "pseudolab")]
#[command(about = "Pseudo-labeling and rotation-prediction demos over a pretrained image model")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the classifier to describe images
    Label {
        /// Label every image instead of one picked at random
        #[arg(long)]
        all: bool,
        /// Use the default image set instead of the given files
        #[arg(long)]
        defaults: bool,
        images: Vec<PathBuf>,
    },
    /// Train and test the rotation predictor
    Rotate {
        /// Number of train-then-test iterations
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
        iterations: u64,
        /// Pause between iterations (overrides the config)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Use the default image set instead of the given files
        #[arg(long)]
        defaults: bool,
        images: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("{err}");
    }
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = DemoConfig::load_or_default(&cli.config)?;
    match cli.command {
        Command::Label {
            all,
            defaults,
            images,
        } => label(&config, all, defaults, &images),
        Command::Rotate {
            iterations,
            delay_ms,
            defaults,
            images,
        } => rotate(&config, iterations, delay_ms, defaults, &images),
    }
}

fn report_unreadable(errors: &[DemoError]) {
    for err in errors {
        tracing::warn!("{err}");
    }
}

fn label(config: &DemoConfig, all: bool, defaults: bool, images: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let mut labeler = PseudoLabeler::new(
        Box::new(PaletteClassifier::default()),
        config.labeling.clone(),
    );
    if defaults {
        labeler.load_defaults(&config.images.default_dir, config.images.default_count);
    } else {
        report_unreadable(&labeler.load_files(images));
    }
    if labeler.images().is_empty() {
        return Err(DemoError::NoImages.into());
    }

    if all {
        let report = labeler.label_all()?;
        for err in &report.failures {
            println!("{err}");
        }
        println!("Finished labeling every image currently loaded.");
    } else {
        let mut rng = rand::rng();
        match labeler.label_random(&mut rng) {
            Ok(Some(outcome)) => {
                println!("{}", outcome.status_line());
                for result in &outcome.results {
                    println!("  {result}");
                }
            }
            Ok(None) => {}
            Err(err) if err.is_image_failure() => {
                println!("{err}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    if !labeler.history().is_empty() {
        println!("\nHistory:");
        for entry in labeler.history().entries() {
            println!("{entry}");
        }
    }
    Ok(())
}

fn rotate(
    config: &DemoConfig,
    iterations: u64,
    delay_ms: Option<u64>,
    defaults: bool,
    images: &[PathBuf],
) -> Result<(), Box<dyn Error>> {
    let settings = config.rotation.clone();
    let embedder = PixelEmbedder::new(settings.embedding_grid);
    let mut session = RotationSession::new(settings, Box::new(embedder));
    if let Some(delay_ms) = delay_ms {
        session.set_delay_ms(delay_ms);
    }
    if defaults {
        session.load_defaults(&config.images.default_dir, config.images.default_count);
    } else {
        report_unreadable(&session.load_files(images));
    }

    let mut controller = LoopController::new();
    controller.start(&session)?;
    controller.run_with(&mut session, Some(iterations), |outcome| match outcome {
        IterationOutcome::Completed(trial) => println!("{}", trial.summary()),
        IterationOutcome::Aborted(err) => println!("skipped: {err}"),
    });

    let counts = session.store().class_counts();
    println!("\n{}", session.stats());
    for (rotation, count) in counts {
        println!("  {rotation}: {count} example(s)");
    }
    Ok(())
}
