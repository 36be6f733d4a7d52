use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visits_core::{AgeBandCount, ClassifierConfig, MonthlyStat};
use visits_engine::{
    age_band_distribution, analyze_records, dataset_fingerprint, records_from_value,
};

#[derive(Parser, Debug)]
#[command(
    name = "visits-cli",
    about = "Phân loại lượt khám và tổng hợp thống kê theo tháng từ file JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON chứa danh sách lượt khám.
    #[arg(short, long)]
    input: PathBuf,

    /// File JSON cấu hình (có thể chỉ chứa một phần các trường).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// In toàn bộ báo cáo dạng JSON thay vì bảng.
    #[arg(long)]
    json: bool,

    /// In thêm phân bố nhóm tuổi.
    #[arg(long)]
    bands: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("visits=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("File {:?} không phải JSON hợp lệ", args.input))?;
    let records = records_from_value(&value)?;

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Không đọc được file cấu hình {path:?}"))?;
            serde_json::from_str::<ClassifierConfig>(&raw)
                .with_context(|| format!("Cấu hình {path:?} không hợp lệ"))?
        }
        None => ClassifierConfig::default(),
    };

    tracing::info!(
        records = records.len(),
        fingerprint = %dataset_fingerprint(&records, &config),
        "loaded visit records"
    );

    let report = analyze_records(&records, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_monthly(&report.monthly);
    if args.bands {
        println!();
        print_bands(&age_band_distribution(&records, &config));
    }

    Ok(())
}

fn print_monthly(stats: &[MonthlyStat]) {
    println!(
        "{:<8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>8}",
        "Month", "Total", "New", "RetNew", "Revis", "Unk", "Endo", "AvgAge"
    );
    for stat in stats {
        let average = stat
            .average_age
            .map(|age| format!("{age:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>8}",
            stat.month,
            stat.total_patients,
            stat.pure_first_visits,
            stat.returning_first_visits,
            stat.revisit_count,
            stat.unknown_count,
            stat.endoscopy_count,
            average
        );
    }
}

fn print_bands(bands: &[AgeBandCount]) {
    for band in bands {
        println!("{:<8} {:>6}", band.band.label(), band.count);
    }
}
