// 🤖 Android Builder - Bake the forest into app source code
//
// Loads the forest saved by the forest builder, scores the common sentence
// patterns with it and emits the Java lookup classifier plus the Kotlin
// service that calls it.

use super::{banner, finish, PipelineReport, TEST_SENTENCES};
use crate::artifacts::ArtifactWriter;
use crate::categories::CategoryRegistry;
use crate::codegen::{self, DEFAULT_PACKAGE, JAVA_CLASS, KOTLIN_CLASS};
use crate::config::{files, BuildConfig};
use crate::keywords::KeywordEngine;
use crate::lookup::{common_patterns, LookupClassifier, LookupTable};
use crate::models::RandomForest;
use anyhow::Result;
use std::collections::BTreeMap;

use super::forest::{load_trained, predict_text};

pub fn build_classifier(forest: &RandomForest) -> LookupClassifier {
    let patterns = common_patterns();
    println!("📊 Testing {} patterns...", patterns.len());
    let table = LookupTable::build(&patterns, |text| predict_text(forest, text));
    println!("✅ Generated {} prediction entries", table.len());
    LookupClassifier::new(table, KeywordEngine::fallback())
}

pub fn run(config: &BuildConfig) -> Result<PipelineReport> {
    banner("🚀 GENERATING ANDROID ML MODEL", 50);

    println!("📊 Step 1: Loading trained model...");
    let forest_path = config.work_file(files::FOREST);
    let forest = load_trained(&forest_path)?;
    println!("✅ Model loaded ({} trees)", forest.trees.len());

    println!("🎯 Step 2: Generating prediction lookup...");
    let classifier = build_classifier(&forest);

    let mut writer = ArtifactWriter::new();

    println!("📱 Step 3: Creating Java prediction class...");
    let java = codegen::java_classifier(DEFAULT_PACKAGE, classifier.table(), classifier.keywords())?;
    writer.write_text(config.java_file(&format!("{}.java", JAVA_CLASS)), &java)?;
    println!("✅ Java class created");

    println!("🔄 Step 4: Updating Android AI service...");
    let kotlin = codegen::kotlin_service(DEFAULT_PACKAGE, &CategoryRegistry::with_defaults())?;
    writer.write_text(config.java_file(&format!("{}.kt", KOTLIN_CLASS)), &kotlin)?;
    println!("✅ Android AI service updated");

    println!("\n✅ ANDROID ML MODEL GENERATION COMPLETED!");
    println!("{}", "=".repeat(50));
    println!("📁 Files created/updated:");
    println!("   - {}.java (lookup classifier)", JAVA_CLASS);
    println!("   - {}.kt (app service)", KOTLIN_CLASS);

    println!("\n🧪 Test Cases:");
    for text in &TEST_SENTENCES[..4] {
        match classifier.table().get(&text.to_lowercase()) {
            Some(entry) => println!("   ✅ '{}' → {} ({:.2})", text, entry.kind, entry.confidence),
            None => {
                let p = classifier.predict(text);
                println!(
                    "   ⚠️ '{}' → Not in lookup (keyword fallback: {} {:.2})",
                    text, p.kind, p.confidence
                );
            }
        }
    }

    let mut metrics = BTreeMap::new();
    metrics.insert("lookup_entries".to_string(), classifier.table().len() as f64);

    finish("android", config, writer, metrics)
}
