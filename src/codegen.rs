// 🧩 Code Generation - App-side classifier sources
//
// Emits the Java lookup classifier (table + keyword fallback) and the Kotlin
// service that calls it. Output only depends on its inputs: table entries
// come out sorted by key.

use crate::categories::CategoryRegistry;
use crate::dataset::TransactionKind;
use crate::keywords::KeywordEngine;
use crate::lookup::LookupTable;
use anyhow::Result;
use std::fmt::Write;

pub const DEFAULT_PACKAGE: &str = "com.aminafi.smartfinance.ai";
pub const JAVA_CLASS: &str = "MLPoweredTransactionClassifier";
pub const KOTLIN_CLASS: &str = "SimpleTransactionAIService";

/// Escape text for a Java/Kotlin double-quoted literal
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

/// Java string literals have no `$` templates; only Kotlin needs `\$`
fn java_literal(text: &str) -> String {
    escape_literal(text).replace("\\$", "$")
}

fn float_literal(value: f64) -> String {
    format!("{:.4}f", value)
}

fn string_array(items: &[&str], indent: &str) -> String {
    items
        .chunks(8)
        .map(|chunk| {
            let quoted: Vec<String> = chunk.iter().map(|k| format!("\"{}\"", java_literal(k))).collect();
            format!("{}{}", indent, quoted.join(", "))
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

// ============================================================================
// JAVA CLASSIFIER
// ============================================================================

pub fn java_classifier(package: &str, table: &LookupTable, keywords: &KeywordEngine) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "package {};", package)?;
    writeln!(out)?;
    writeln!(out, "import java.util.HashMap;")?;
    writeln!(out, "import java.util.Map;")?;
    writeln!(out)?;
    writeln!(out, "/**")?;
    writeln!(out, " * Transaction classifier generated from the trained random forest.")?;
    writeln!(out, " * Exact and amount-normalised lookups first, keyword vote otherwise.")?;
    writeln!(out, " */")?;
    writeln!(out, "public class {} {{", JAVA_CLASS)?;
    writeln!(out)?;
    writeln!(
        out,
        "    private static final Map<String, PredictionResult> predictionMap = new HashMap<>();"
    )?;
    writeln!(out)?;
    writeln!(out, "    static {{")?;
    writeln!(out, "        initializePredictions();")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    private static void initializePredictions() {{")?;
    for (key, entry) in table.iter() {
        writeln!(
            out,
            "        predictionMap.put(\"{}\", new PredictionResult(\"{}\", {}, \"{}\"));",
            java_literal(key),
            entry.kind.as_str(),
            float_literal(entry.confidence),
            java_literal(&entry.pattern)
        )?;
    }
    writeln!(out, "    }}")?;

    out.push_str(
        r#"
    public static PredictionResult predict(String text) {
        if (text == null || text.trim().isEmpty()) {
            return new PredictionResult("EXPENSE", 0.5f, "Empty input");
        }

        String normalizedText = text.toLowerCase().trim();

        PredictionResult directMatch = predictionMap.get(normalizedText);
        if (directMatch != null) {
            return directMatch;
        }

        String amountPattern = normalizedText.replaceAll("\\d+", "AMOUNT");
        PredictionResult patternMatch = predictionMap.get(amountPattern);
        if (patternMatch != null) {
            return patternMatch;
        }

        return keywordBasedPrediction(normalizedText);
    }

    private static PredictionResult keywordBasedPrediction(String text) {
"#,
    );

    writeln!(out, "        String[] expenseKeywords = {{")?;
    writeln!(out, "{}", string_array(&keywords.keywords(TransactionKind::Expense), "            "))?;
    writeln!(out, "        }};")?;
    writeln!(out)?;
    writeln!(out, "        String[] incomeKeywords = {{")?;
    writeln!(out, "{}", string_array(&keywords.keywords(TransactionKind::Income), "            "))?;
    writeln!(out, "        }};")?;

    out.push_str(
        r#"
        int expenseScore = 0;
        int incomeScore = 0;

        for (String keyword : expenseKeywords) {
            if (text.contains(keyword)) {
                expenseScore++;
            }
        }

        for (String keyword : incomeKeywords) {
            if (text.contains(keyword)) {
                incomeScore++;
            }
        }

        if (expenseScore > incomeScore) {
            float confidence = Math.min(0.8f, 0.5f + (expenseScore * 0.1f));
            return new PredictionResult("EXPENSE", confidence, "Keyword analysis");
        } else if (incomeScore > expenseScore) {
            float confidence = Math.min(0.8f, 0.5f + (incomeScore * 0.1f));
            return new PredictionResult("INCOME", confidence, "Keyword analysis");
        } else {
            return new PredictionResult("EXPENSE", 0.6f, "Default classification");
        }
    }

    public static class PredictionResult {
        public final String type;
        public final float confidence;
        public final String analysis;

        public PredictionResult(String type, float confidence, String analysis) {
            this.type = type;
            this.confidence = confidence;
            this.analysis = analysis;
        }

        @Override
        public String toString() {
            return String.format("PredictionResult{type='%s', confidence=%.2f, analysis='%s'}",
                               type, confidence, analysis);
        }
    }
}
"#,
    );

    Ok(out)
}

// ============================================================================
// KOTLIN SERVICE
// ============================================================================

pub fn kotlin_service(package: &str, categories: &CategoryRegistry) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "package {}", package)?;
    out.push_str(
        r#"
import com.aminafi.smartfinance.TransactionType
import kotlinx.coroutines.delay

/**
 * Transaction detection backed by the generated lookup classifier.
 */
class SimpleTransactionAIService : TransactionAIService {

    override suspend fun detectTransaction(message: String): Result<AIDetectedTransaction> {
        delay((50..150).random().toLong())

        val lowerMessage = message.lowercase().trim()

        val amount = extractAmount(lowerMessage)
        if (amount <= 0) {
            return Result.failure(Exception("Please include an amount (e.g., $50, 50 dollars, or ₹100)"))
        }

        val mlPrediction = MLPoweredTransactionClassifier.predict(lowerMessage)

        val transactionType = when (mlPrediction.type) {
            "INCOME" -> TransactionType.INCOME
            else -> TransactionType.EXPENSE
        }

        val title = generateSmartTitle(lowerMessage, transactionType)

        val transaction = AIDetectedTransaction(
            amount = amount,
            type = transactionType,
            title = title,
            description = message,
            confidence = mlPrediction.confidence.toDouble()
        )

        return Result.success(transaction)
    }

    private fun extractAmount(text: String): Double {
        val patterns = listOf(
            Regex("(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)\\s*(?:dollars?|bucks?|usd|\\$)"),
            Regex("\\$(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)"),
            Regex("(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)\\s*(?:rupees?|rs|₹|inr)"),
            Regex("₹(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)"),
            Regex("(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)\\s*(?:euros?|eur|€)"),
            Regex("€(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)"),
            Regex("(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)\\s*(?:pounds?|gbp|£)"),
            Regex("£(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)"),
            Regex("(\\d+(?:,\\d{3})*(?:\\.\\d{1,2})?)")
        )

        for (pattern in patterns) {
            val match = pattern.find(text)
            if (match != null) {
                val amount = match.groupValues[1].replace(",", "").toDoubleOrNull()
                if (amount != null && amount > 0) {
                    return amount
                }
            }
        }

        return 0.0
    }

    private fun generateSmartTitle(text: String, type: TransactionType): String {
        val lowerText = text.lowercase()

        when {
"#,
    );

    for category in categories.categories() {
        let conditions: Vec<String> = category
            .keywords
            .iter()
            .map(|k| format!("lowerText.contains(\"{}\")", escape_literal(k)))
            .collect();
        writeln!(out, "            {} -> {{", conditions.join(" ||\n            "))?;
        writeln!(out, "                return \"{}\"", escape_literal(&category.name))?;
        writeln!(out, "            }}")?;
    }

    out.push_str(
        r#"        }

        return when (type) {
            TransactionType.INCOME -> "Income Transaction"
            TransactionType.EXPENSE -> "Expense Transaction"
        }
    }
}
"#,
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::common_patterns;
    use crate::models::Prediction;

    fn table() -> LookupTable {
        let patterns = vec!["Paid \"50\" for gas".to_string(), "Bonus payment 500".to_string()];
        LookupTable::build(&patterns, |text| {
            if text.contains("Bonus") {
                Prediction::new(TransactionKind::Income, 0.97, "")
            } else {
                Prediction::new(TransactionKind::Expense, 0.9, "")
            }
        })
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"say "hi" \ $5"#), r#"say \"hi\" \\ \$5"#);
        assert_eq!(java_literal("$5"), "$5");
    }

    #[test]
    fn test_java_has_sorted_escaped_entries() {
        let java = java_classifier(DEFAULT_PACKAGE, &table(), &KeywordEngine::fallback()).unwrap();

        assert!(java.starts_with("package com.aminafi.smartfinance.ai;"));
        assert!(java.contains(
            r#"predictionMap.put("bonus payment 500", new PredictionResult("INCOME", 0.9700f, "Bonus payment 500"));"#
        ));
        assert!(java.contains(r#"predictionMap.put("paid \"50\" for gas""#));
        assert!(java.contains(r#"replaceAll("\\d+", "AMOUNT")"#));

        let bonus = java.find("\"bonus payment 500\"").unwrap();
        let paid = java.find("\"paid \\\"50\\\" for gas\"").unwrap();
        assert!(bonus < paid);
    }

    #[test]
    fn test_java_output_is_deterministic() {
        let t = LookupTable::build(&common_patterns(), |t| KeywordEngine::fallback().classify(t));
        let a = java_classifier(DEFAULT_PACKAGE, &t, &KeywordEngine::fallback()).unwrap();
        let b = java_classifier(DEFAULT_PACKAGE, &t, &KeywordEngine::fallback()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"treated myself\""));
        assert!(a.contains("\"funds\""));
    }

    #[test]
    fn test_kotlin_titles_come_from_categories() {
        let kotlin = kotlin_service(DEFAULT_PACKAGE, &CategoryRegistry::with_defaults()).unwrap();
        assert!(kotlin.starts_with("package com.aminafi.smartfinance.ai\n"));
        assert!(kotlin.contains("return \"Bills & Utilities\""));
        assert!(kotlin.contains("lowerText.contains(\"payroll\")"));
        assert!(kotlin.contains("MLPoweredTransactionClassifier.predict(lowerMessage)"));
    }
}
