use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::Value;
use stresswatch_core::{ClosePoint, Envelope, MarketQuote, PairSignal, RiskSignal};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// A command's envelope plus its pre-rendered table lines.
pub struct Rendered {
    pub envelope: Envelope<Value>,
    pub table: Vec<String>,
    /// Instruments that degraded to the sentinel in this result.
    pub unavailable: usize,
}

pub fn render(rendered: &Rendered, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&rendered.envelope)?
            } else {
                serde_json::to_string(&rendered.envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => render_table(&mut out, rendered)?,
    }
    out.flush()?;
    Ok(())
}

fn render_table(out: &mut impl Write, rendered: &Rendered) -> Result<(), CliError> {
    let meta = &rendered.envelope.meta;
    writeln!(out, "generated_at: {}", meta.generated_at)?;
    writeln!(out, "source      : {}", meta.source)?;
    writeln!(out, "latency_ms  : {}", meta.latency_ms)?;
    writeln!(out, "cache_hit   : {}", meta.cache_hit)?;
    writeln!(out)?;

    if rendered.table.is_empty() {
        let pretty_data = serde_json::to_string_pretty(&rendered.envelope.data)?;
        for line in pretty_data.lines() {
            writeln!(out, "  {line}")?;
        }
    } else {
        for line in &rendered.table {
            writeln!(out, "{line}")?;
        }
    }

    if !meta.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "warnings:")?;
        for warning in &meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    Ok(())
}

pub fn quote_table(quotes: &[MarketQuote]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<8} {:<26} {:>14} {:>9}  {}",
        "LABEL", "NAME", "VALUE", "CHANGE", "STATUS"
    )];
    lines.extend(quotes.iter().map(|quote| {
        format!(
            "{:<8} {:<26} {:>14} {:>8}%  {}",
            quote.ticker_label,
            quote.display_name,
            quote.formatted_value,
            format!("{:+.2}", quote.change_pct),
            quote.status
        )
    }));
    lines
}

pub fn risk_table(risk: &RiskSignal) -> Vec<String> {
    let mut lines = vec![format!(
        "risk: {} {} (score {})",
        risk.level.emoji(),
        risk.level,
        risk.score
    )];
    if risk.factors.is_empty() {
        lines.push("  no factors fired".to_owned());
    }
    lines.extend(
        risk.factors
            .iter()
            .map(|factor| format!("  - {}", factor.description)),
    );
    lines
}

pub fn pair_table(pairs: &BTreeMap<String, PairSignal>) -> Vec<String> {
    if pairs.is_empty() {
        return vec!["pairs: none available".to_owned()];
    }
    let mut lines = vec![format!("{:<13} {:<13} {}", "PAIR", "CALL", "DESCRIPTION")];
    lines.extend(pairs.values().map(|signal| {
        format!(
            "{:<13} {:<13} {}",
            signal.pair_id,
            signal.call.as_str(),
            signal.description
        )
    }));
    lines
}

pub fn history_table(points: &[ClosePoint]) -> Vec<String> {
    let mut lines = vec![format!("{:<21} {:>14}", "DATE", "CLOSE")];
    lines.extend(
        points
            .iter()
            .map(|point| format!("{:<21} {:>14.4}", point.ts.format_rfc3339(), point.close)),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use stresswatch_core::{InstrumentCatalog, RiskScoringEngine};

    #[test]
    fn quote_table_has_header_and_one_row_per_quote() {
        let catalog = InstrumentCatalog::builtin();
        let quotes = vec![
            MarketQuote::from_observations(catalog.get("vix").expect("vix"), 22.0, Some(20.0)),
            MarketQuote::unavailable(catalog.get("gold").expect("gold")),
        ];
        let lines = quote_table(&quotes);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("+10.00%"));
        assert!(lines[2].contains("N/A"));
        assert!(lines[2].ends_with("error"));
    }

    #[test]
    fn empty_risk_says_so() {
        let risk = RiskScoringEngine::new().evaluate(&[]);
        let lines = risk_table(&risk);
        assert!(lines[0].contains("low"));
        assert_eq!(lines[1], "  no factors fired");
    }
}
