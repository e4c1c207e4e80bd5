use anyhow::Result;
use indicator_report::{
    calc::{acceleration_column, moving_average_column, velocity_column},
    emit::ChartKind,
    load::RawSheet,
    pipeline, ArtifactWriteError, Config, DataError,
};
use rust_xlsxwriter::Workbook;
use std::{fs, path::Path};
use tempfile::tempdir;

const HEADINGS: [&str; 4] = [
    "Ano",
    "População Estimada",
    "PIB Estimado (R$ em Bilhões)",
    "Renda per capita",
];

/// 2010–2024, rows shuffled, income missing in 2012–2013 and 2024,
/// with a title row above the header.
fn write_input(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Socioeconomic indicators")?;
    for (c, h) in HEADINGS.iter().enumerate() {
        sheet.write_string(1, c as u16, *h)?;
    }

    let mut years: Vec<i64> = (2010..=2024).collect();
    years.reverse();
    for (i, year) in years.iter().enumerate() {
        let row = 2 + i as u32;
        let k = (year - 2010) as f64;
        sheet.write_number(row, 0, *year as f64)?;
        sheet.write_number(row, 1, 6.5 + 0.05 * k)?;
        let gdp = if (2020..=2021).contains(year) { 90.0 } else { 80.0 + 5.0 * k };
        sheet.write_number(row, 2, gdp)?;
        if !matches!(year, 2012 | 2013 | 2024) {
            sheet.write_number(row, 3, 400.0 + 30.0 * k)?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

fn config_in(dir: &Path, input: &Path) -> Config {
    Config {
        input: input.to_path_buf(),
        output_sheet: dir.join("analysis.xlsx"),
        output_parquet: Some(dir.join("analysis.parquet")),
        report: dir.join("report.html"),
        chart_dir: dir.join("charts"),
        ..Config::default()
    }
}

#[test]
fn full_run_produces_artifacts_and_removes_charts() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.xlsx");
    write_input(&input)?;
    let config = config_in(dir.path(), &input);

    let summary = pipeline::run(&config)?;
    assert_eq!(summary.rows, 15);
    assert_eq!(summary.columns, 5 + 3 * 2 + 3 * 2);
    assert_eq!(summary.charts, 3);
    assert_eq!(summary.cleanup_failures, 0);

    // spreadsheet: header + one row per year, ascending
    let out = RawSheet::read(&config.output_sheet)?;
    assert_eq!(out.rows.len(), 16);
    let header = &out.rows[0];
    assert_eq!(header[0], "Year");
    assert_eq!(header[4], "Per-Capita Income (Interpolated)");
    assert_eq!(header[5], velocity_column("Estimated Population"));
    assert_eq!(header[8], acceleration_column("Estimated GDP"));
    assert_eq!(
        header[16],
        moving_average_column("Per-Capita Income (Interpolated)", 7)
    );
    let years: Vec<&str> = out.rows[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(years.first(), Some(&"2010"));
    assert_eq!(years.last(), Some(&"2024"));
    assert!(years.windows(2).all(|w| w[0] < w[1]));

    // interior gap filled, trailing gap left empty
    let row_2013 = &out.rows[4];
    assert_eq!(row_2013[0], "2013");
    assert_eq!(row_2013[3], "");
    assert_eq!(row_2013[4], "490");
    assert_eq!(out.rows[15][4], "");

    // population velocity uses the biennial step
    assert_eq!(out.rows[1][5], "");
    let pop_velocity: f64 = out.rows[2][5].parse()?;
    assert!((pop_velocity - 0.025).abs() < 1e-9);

    assert!(config.output_parquet.as_ref().is_some_and(|p| p.exists()));

    let html = fs::read_to_string(&config.report)?;
    assert!(html.contains("Impact of the COVID Period"));
    assert!(html.contains("2010 to 2024"));
    for kind in ChartKind::ALL {
        assert!(html.contains(kind.title()));
        assert!(!config.chart_dir.join(kind.file_name()).exists());
    }
    Ok(())
}

#[test]
fn csv_input_is_accepted() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.csv");
    fs::write(
        &input,
        "Year,Estimated Population,Estimated GDP,Per-Capita Income\n\
         2011,6.6,85,\n\
         2010,6.5,80,100\n\
         2012,6.7,90,130\n",
    )?;
    let config = Config {
        output_parquet: None,
        ..config_in(dir.path(), &input)
    };

    let summary = pipeline::run(&config)?;
    assert_eq!(summary.rows, 3);
    assert!(!dir.path().join("analysis.parquet").exists());

    let out = RawSheet::read(&config.output_sheet)?;
    assert_eq!(out.rows[2][0], "2011");
    assert_eq!(out.rows[2][4], "115");
    Ok(())
}

#[test]
fn missing_field_aborts_before_any_output() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.csv");
    fs::write(&input, "Year,Estimated GDP\n2010,80\n")?;
    let config = config_in(dir.path(), &input);

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::MissingField { .. })
    ));
    assert!(!config.output_sheet.exists());
    assert!(!config.report.exists());
    Ok(())
}

#[test]
fn report_failure_still_removes_charts() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.xlsx");
    write_input(&input)?;
    let config = Config {
        report: dir.path().join("missing").join("report.html"),
        ..config_in(dir.path(), &input)
    };

    let err = pipeline::run(&config).unwrap_err();
    let artifact = err
        .downcast_ref::<ArtifactWriteError>()
        .expect("report failure should surface as ArtifactWriteError");
    assert_eq!(artifact.kind, "report");
    assert!(!config.report.exists());
    for kind in ChartKind::ALL {
        assert!(!config.chart_dir.join(kind.file_name()).exists());
    }
    // outputs written before the report stage stay in place
    assert!(config.output_sheet.exists());
    Ok(())
}
