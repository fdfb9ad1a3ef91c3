//! Report generation.
//!
//! This module runs the six standard reports over a loaded dataset:
//! console statistics plus one chart file each. Every report recomputes
//! its own aggregate and renders through the caller's [`Renderer`], and a
//! failing report never stops the ones after it.
//!
//! Chart titles and axis labels stay in Portuguese; the generated files
//! are compared side by side with the historical reports and have to read
//! the same.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use plotters::style::RGBColor;
use tracing::{debug, error, info};

use crate::analysis::{
    attack_category_counts, protocol_counts, protocol_outcomes, service_counts, temporal_trend,
    top_protocol_mix, traffic_summary,
};
use crate::models::Dataset;
use crate::render::{ChartKind, Figure, Renderer, Series};

/// File stems of the six standard reports, in run order. The renderer
/// decides the extension.
pub const REPORT_STEMS: [&str; 6] = [
    "1_resumo_geral",
    "2_distribuicao_ataques",
    "3_distribuicao_protocolos",
    "4_top_5_servicos",
    "5_tendencia_temporal",
    "6_insight_protocolos_ataque",
];

/// How many protocols the general ranking keeps.
const TOP_PROTOCOLS: usize = 10;

/// How many services the service ranking keeps.
const TOP_SERVICES: usize = 5;

/// How many protocols the attack-mix insight keeps.
const INSIGHT_PROTOCOLS: usize = 15;

/// How many cross-tab rows the insight report prints to the console.
const INSIGHT_CONSOLE_ROWS: usize = 5;

// Fixed artifact palette, kept stable so charts stay comparable across
// runs: material green/red for the pie, one darkened base tone per
// ranking chart, plain red/green trend lines, red/blue mix segments.
const PIE_NORMAL: RGBColor = RGBColor(0x4C, 0xAF, 0x50);
const PIE_ATTACK: RGBColor = RGBColor(0xF4, 0x43, 0x36);
const CATEGORY_RED: RGBColor = RGBColor(0xC6, 0x28, 0x28);
const PROTOCOL_BLUE: RGBColor = RGBColor(0x15, 0x65, 0xC0);
const SERVICE_GREEN: RGBColor = RGBColor(0x2E, 0x7D, 0x32);
const TREND_ATTACK: RGBColor = RGBColor(0xFF, 0x00, 0x00);
const TREND_NORMAL: RGBColor = RGBColor(0x00, 0x80, 0x00);
const MIX_NORMAL: RGBColor = RGBColor(0xB4, 0x04, 0x26);
const MIX_ATTACK: RGBColor = RGBColor(0x3B, 0x4C, 0xC0);

/// What happened across a full report run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Charts written to disk.
    pub written: usize,
    /// Reports that ran but had no data subset to chart.
    pub skipped: usize,
    /// Reports that failed outright.
    pub failed: usize,
}

/// Run all six reports in order.
///
/// A report that fails is counted and logged, then the run moves on; the
/// caller decides what a non-zero `failed` means for the exit code. An
/// empty dataset is refused outright since every percentage in the run
/// would be undefined.
pub fn run_all(dataset: &Dataset, renderer: &dyn Renderer) -> Result<RunOutcome> {
    ensure!(
        !dataset.is_empty(),
        "cannot generate reports for an empty dataset"
    );

    type ReportFn = fn(&Dataset, &dyn Renderer) -> Result<Option<PathBuf>>;
    let reports: [(&str, ReportFn); 6] = [
        ("overall traffic summary", report_overall_summary),
        ("attack category distribution", report_attack_categories),
        ("protocol distribution", report_protocols),
        ("top services", report_services),
        ("temporal trend", report_temporal_trend),
        ("protocol attack insight", report_protocol_insight),
    ];

    let mut outcome = RunOutcome::default();
    for (name, report) in reports {
        match report(dataset, renderer) {
            Ok(Some(path)) => {
                debug!("report '{}' written to {}", name, path.display());
                outcome.written += 1;
            }
            Ok(None) => {
                info!("report '{}' skipped: nothing to chart", name);
                outcome.skipped += 1;
            }
            Err(e) => {
                error!("report '{}' failed: {:#}", name, e);
                eprintln!("   ❌ Report failed: {e:#}");
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Report 1: normal vs. attack share of all traffic, as a pie chart.
/// Always renders; a dataset without attacks still has a valid split.
fn report_overall_summary(
    dataset: &Dataset,
    renderer: &dyn Renderer,
) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 1/6: Overall traffic summary");

    let summary = traffic_summary(dataset);
    println!("   Total connections: {}", summary.total);
    println!(
        "   Normal connections: {} ({:.1}%)",
        summary.normal, summary.perc_normal
    );
    println!(
        "   Attack connections: {} ({:.1}%)",
        summary.attacks, summary.perc_attack
    );

    let figure = Figure {
        kind: ChartKind::Pie,
        title: "Relatório 1: Resumo do Tráfego: Normal vs. Ataque".to_string(),
        x_label: String::new(),
        y_label: String::new(),
        labels: vec![],
        series: vec![
            Series {
                name: "Normal".to_string(),
                values: vec![summary.perc_normal],
                color: PIE_NORMAL,
            },
            Series {
                name: "Ataque".to_string(),
                values: vec![summary.perc_attack],
                color: PIE_ATTACK,
            },
        ],
        size: (800, 600),
    };

    let path = renderer.render(&figure, REPORT_STEMS[0])?;
    println!("   💾 Saved: {}", path.display());
    Ok(Some(path))
}

/// Report 2: attack volume per category, ranked. Skipped when the
/// dataset holds no attacks at all.
fn report_attack_categories(
    dataset: &Dataset,
    renderer: &dyn Renderer,
) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 2/6: Attack distribution by category");

    let categories = attack_category_counts(dataset);
    if categories.is_empty() {
        println!("   ⚠️  No attack records in the dataset; skipping chart.");
        return Ok(None);
    }

    println!("   Attacks per category:");
    for entry in &categories {
        println!("   {:<24} {}", entry.value, entry.count);
    }

    let figure = Figure {
        kind: ChartKind::HorizontalBar,
        title: "Relatório 2: Distribuição de Ataques por Categoria".to_string(),
        x_label: "Número de Conexões".to_string(),
        y_label: "Categoria do Ataque".to_string(),
        labels: categories.iter().map(|c| c.value.clone()).collect(),
        series: vec![Series {
            name: "Ataques".to_string(),
            values: categories.iter().map(|c| c.count as f64).collect(),
            color: CATEGORY_RED,
        }],
        size: (1200, 700),
    };

    let path = renderer.render(&figure, REPORT_STEMS[1])?;
    println!("   💾 Saved: {}", path.display());
    Ok(Some(path))
}

/// Report 3: the ten busiest protocols across all traffic. A non-empty
/// dataset always has at least one protocol, so this never skips.
fn report_protocols(dataset: &Dataset, renderer: &dyn Renderer) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 3/6: Most used protocols");

    let protocols = protocol_counts(dataset, TOP_PROTOCOLS);
    println!("   Top {} protocols by connection count:", TOP_PROTOCOLS);
    for entry in &protocols {
        println!("   {:<24} {}", entry.value, entry.count);
    }

    let figure = Figure {
        kind: ChartKind::HorizontalBar,
        title: "Relatório 3: Top 10 Protocolos Mais Utilizados (Geral)".to_string(),
        x_label: "Número de Conexões".to_string(),
        y_label: "Protocolo".to_string(),
        labels: protocols.iter().map(|c| c.value.clone()).collect(),
        series: vec![Series {
            name: "Conexões".to_string(),
            values: protocols.iter().map(|c| c.count as f64).collect(),
            color: PROTOCOL_BLUE,
        }],
        size: (1000, 600),
    };

    let path = renderer.render(&figure, REPORT_STEMS[2])?;
    println!("   💾 Saved: {}", path.display());
    Ok(Some(path))
}

/// Report 4: the five busiest named services. Skipped when every record
/// carries the unknown-service sentinel.
fn report_services(dataset: &Dataset, renderer: &dyn Renderer) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 4/6: Most accessed services");

    let services = service_counts(dataset, TOP_SERVICES);
    if services.is_empty() {
        println!("   ⚠️  No named services in the dataset; skipping chart.");
        return Ok(None);
    }

    println!("   Top {} services (unknown \"-\" excluded):", TOP_SERVICES);
    for entry in &services {
        println!("   {:<24} {}", entry.value, entry.count);
    }

    let figure = Figure {
        kind: ChartKind::HorizontalBar,
        title: "Relatório 4: Top 5 Serviços Mais Acessados (excluindo \"-\")".to_string(),
        x_label: "Número de Conexões".to_string(),
        y_label: "Serviço".to_string(),
        labels: services.iter().map(|c| c.value.clone()).collect(),
        series: vec![Series {
            name: "Conexões".to_string(),
            values: services.iter().map(|c| c.count as f64).collect(),
            color: SERVICE_GREEN,
        }],
        size: (1000, 500),
    };

    let path = renderer.render(&figure, REPORT_STEMS[3])?;
    println!("   💾 Saved: {}", path.display());
    Ok(Some(path))
}

/// Report 5: attack and normal volume over positional record batches.
/// The dataset is non-empty, so there is always at least one batch.
fn report_temporal_trend(dataset: &Dataset, renderer: &dyn Renderer) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 5/6: Temporal trend (simulated)");

    let trend = temporal_trend(dataset);
    println!(
        "   Batch size: {} records across {} batches",
        trend.batch_size,
        trend.bins()
    );

    let figure = Figure {
        kind: ChartKind::DualLine,
        title: "Relatório 5: Tendência de Tráfego (Simulada por Lotes de Registros)".to_string(),
        x_label: format!("Lote de Registros (Tamanho do Lote: {})", trend.batch_size),
        y_label: "Número de Conexões".to_string(),
        labels: vec![],
        series: vec![
            Series {
                name: "Ataques".to_string(),
                values: trend.attacks.iter().map(|&v| v as f64).collect(),
                color: TREND_ATTACK,
            },
            Series {
                name: "Normal".to_string(),
                values: trend.normals.iter().map(|&v| v as f64).collect(),
                color: TREND_NORMAL,
            },
        ],
        size: (1400, 600),
    };

    let path = renderer.render(&figure, REPORT_STEMS[4])?;
    println!(
        "   💾 Saved: {} (batches of {} connections)",
        path.display(),
        trend.batch_size
    );
    Ok(Some(path))
}

/// Report 6: attack share per protocol, with a stacked outcome-mix chart
/// of the busiest protocols. Skipped when the dataset holds no attacks.
fn report_protocol_insight(
    dataset: &Dataset,
    renderer: &dyn Renderer,
) -> Result<Option<PathBuf>> {
    println!("\n📊 Report 6/6: Protocol attack insight");

    let outcomes = protocol_outcomes(dataset);
    if outcomes.iter().all(|o| o.attacks == 0) {
        println!("   ⚠️  No attack records in the dataset; skipping chart.");
        return Ok(None);
    }

    println!("   Attack share by protocol:");
    for row in outcomes.iter().take(INSIGHT_CONSOLE_ROWS) {
        println!(
            "   {:<12} {:>5.1}% ({} of {})",
            row.proto,
            row.perc_attack(),
            row.attacks,
            row.total()
        );
    }

    let mix = top_protocol_mix(dataset, INSIGHT_PROTOCOLS);
    let figure = Figure {
        kind: ChartKind::StackedHorizontalBar,
        title: "Relatório 6: Proporção Ataque vs. Normal por Protocolo (Top 15)".to_string(),
        x_label: "Proporção".to_string(),
        y_label: "Protocolo".to_string(),
        labels: mix.iter().map(|m| m.proto.clone()).collect(),
        series: vec![
            Series {
                name: "Normal".to_string(),
                values: mix.iter().map(|m| m.normal_share).collect(),
                color: MIX_NORMAL,
            },
            Series {
                name: "Ataque".to_string(),
                values: mix.iter().map(|m| m.attack_share).collect(),
                color: MIX_ATTACK,
            },
        ],
        size: (1200, 800),
    };

    let path = renderer.render(&figure, REPORT_STEMS[5])?;
    println!("   💾 Saved: {}", path.display());
    Ok(Some(path))
}
