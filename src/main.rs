use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use smartfinance_models::config::{files, DEFAULT_ASSETS_DIR, DEFAULT_JAVA_DIR};
use smartfinance_models::lookup::common_patterns;
use smartfinance_models::pipelines::android::build_classifier;
use smartfinance_models::pipelines::forest::load_trained;
use smartfinance_models::{
    basic_examples, contextual_examples, extract_amount, BuildConfig, CategoryRegistry, Dataset,
    KeywordEngine, LookupClassifier, LookupTable, Pipeline, PipelineReport, QualityEngine,
    QualityReport, SemanticRuleClassifier, Severity, TemplateSet,
};

#[derive(Parser)]
#[command(name = "smartfinance-models")]
#[command(version, about = "Builds the SmartFinance transaction classifier artifacts")]
struct Cli {
    /// App asset folder
    #[arg(long, global = true, env = "SMARTFINANCE_ASSETS_DIR", default_value = DEFAULT_ASSETS_DIR)]
    assets_dir: PathBuf,

    /// Package folder for generated Java/Kotlin
    #[arg(long, global = true, env = "SMARTFINANCE_JAVA_DIR", default_value = DEFAULT_JAVA_DIR)]
    java_dir: PathBuf,

    /// Intermediate models and the build manifest
    #[arg(long, global = true, env = "SMARTFINANCE_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    #[arg(long, global = true, env = "SMARTFINANCE_SEED", default_value_t = 42)]
    seed: u64,

    #[arg(long, global = true, default_value_t = 25_000)]
    forest_samples: usize,

    #[arg(long, global = true, default_value_t = 20_000)]
    mobile_samples: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Basic vocabulary + reference logistic regression
    Simple,
    /// Enhanced vocabulary + hybrid config, no training
    Manual,
    /// Random forest over semantic features
    Forest,
    /// Conv network on the comprehensive dataset
    Mobile,
    /// Averaged-embedding network on the contextual examples
    Smart,
    /// Java/Kotlin sources from the trained forest
    Android,
    /// simple, manual, forest, android (networks on request)
    All {
        #[arg(long)]
        with_networks: bool,
    },
    /// Classify one sentence the way the app would
    Predict { text: String },
    /// Write a labeled dataset as CSV
    ExportDataset {
        #[arg(long, value_enum, default_value_t = Preset::Advanced)]
        preset: Preset,
        /// Examples to synthesize (template presets only)
        #[arg(long, default_value_t = 1000)]
        count: usize,
        #[arg(long)]
        output: PathBuf,
    },
    /// Check the assets folder (and optionally a dataset CSV)
    Verify {
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Basic,
    Contextual,
    Advanced,
    Comprehensive,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("   caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smartfinance_models=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = BuildConfig {
        assets_dir: cli.assets_dir,
        java_dir: cli.java_dir,
        work_dir: cli.work_dir,
        seed: cli.seed,
        forest_samples: cli.forest_samples,
        mobile_samples: cli.mobile_samples,
    };
    tracing::debug!(?config, "build configuration");

    match cli.command {
        Command::Simple => report(Pipeline::Simple.run(&config)?),
        Command::Manual => report(Pipeline::Manual.run(&config)?),
        Command::Forest => report(Pipeline::Forest.run(&config)?),
        Command::Mobile => report(Pipeline::Mobile.run(&config)?),
        Command::Smart => report(Pipeline::Smart.run(&config)?),
        Command::Android => report(Pipeline::Android.run(&config)?),
        Command::All { with_networks } => {
            for pipeline in Pipeline::sequence(with_networks) {
                report(pipeline.run(&config)?);
                println!();
            }
        }
        Command::Predict { text } => predict(&config, &text)?,
        Command::ExportDataset { preset, count, output } => export_dataset(&config, preset, count, &output)?,
        Command::Verify { dataset } => verify(&config, dataset)?,
    }

    Ok(())
}

fn report(report: PipelineReport) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 {} builder wrote {} files", report.pipeline, report.files.len());
    for (name, value) in &report.metrics {
        println!("   {}: {:.4}", name, value);
    }
    println!("🧾 Manifest: {}", report.manifest.display());
}

// ============================================================================
// PREDICT
// ============================================================================

fn predict(config: &BuildConfig, text: &str) -> Result<()> {
    let forest_path = config.work_file(files::FOREST);
    let classifier = if forest_path.exists() {
        let forest = load_trained(&forest_path)?;
        build_classifier(&forest)
    } else {
        tracing::warn!(path = %forest_path.display(), "no trained forest, lookup table uses keyword votes");
        let keywords = KeywordEngine::fallback();
        let table = LookupTable::build(&common_patterns(), |t| keywords.classify(t));
        LookupClassifier::new(table, KeywordEngine::fallback())
    };

    println!("\n🔍 '{}'", text);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let lookup = classifier.predict(text);
    println!("📱 App classifier:   {}", lookup.summary());

    let semantic = SemanticRuleClassifier.classify(text);
    println!("🧠 Semantic rules:   {}", semantic.summary());

    match extract_amount(text) {
        Some(amount) => println!(
            "💰 Amount:           {:.2} {}",
            amount.value,
            amount.currency.map(|c| c.code()).unwrap_or("(no currency)")
        ),
        None => println!("💰 Amount:           none (the app asks for one, e.g. $50 or ₹100)"),
    }

    let categories = CategoryRegistry::with_defaults();
    let title = categories.suggest_title(text, lookup.kind);
    let icon = categories.find(text).map(|c| c.icon.as_str()).unwrap_or("📝");
    println!("{} Title:            {}", icon, title);

    Ok(())
}

// ============================================================================
// DATASET EXPORT + VERIFY
// ============================================================================

fn export_dataset(config: &BuildConfig, preset: Preset, count: usize, output: &Path) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let dataset: Dataset = match preset {
        Preset::Basic => basic_examples(),
        Preset::Contextual => contextual_examples(),
        Preset::Advanced => TemplateSet::advanced().synthesize(count, &mut rng),
        Preset::Comprehensive => TemplateSet::comprehensive().synthesize(count, &mut rng),
    };

    dataset.write_csv(output)?;
    println!("✅ Wrote {} examples to {}", dataset.len(), output.display());

    let quality = QualityEngine::new().validate_dataset(&output.display().to_string(), &dataset);
    print_quality(&quality);
    Ok(())
}

fn verify(config: &BuildConfig, dataset: Option<PathBuf>) -> Result<()> {
    let engine = QualityEngine::new();
    let mut reports = vec![engine.validate_assets(&config.assets_dir)];

    if let Some(path) = dataset {
        let ds = Dataset::read_csv(&path)?;
        reports.push(engine.validate_dataset(&path.display().to_string(), &ds));
    }

    for quality in &reports {
        print_quality(quality);
    }

    let critical: usize = reports
        .iter()
        .map(|r| r.issues.iter().filter(|i| i.severity == Severity::Critical).count())
        .sum();
    if critical > 0 {
        bail!("{} critical issue(s) found", critical);
    }
    println!("\n✅ All checks passed");
    Ok(())
}

fn print_quality(report: &QualityReport) {
    println!("\n🔍 {}", report.target);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for v in &report.validations {
        let mark = if v.passed { "✓" } else { "✗" };
        println!("   {} [{}] {}: {}", mark, v.artifact, v.rule_name, v.message);
    }
    for issue in &report.issues {
        println!("   ⚠️ {:?}: {} → {}", issue.severity, issue.issue, issue.recommendation);
    }
    println!("📊 {}", report.summary());
}
