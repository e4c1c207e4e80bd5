use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::{fs, io::Write, path::Path};
use tracing::info;

use crate::calc::Dispersion;
use crate::emit::chart::{ChartKind, RenderedChart};
use crate::error::ArtifactWriteError;
use crate::table::{value_at, IndicatorTable, GDP, INCOME, INCOME_INTERPOLATED, POPULATION, YEAR};

pub const NOT_COMPUTABLE: &str = "not computable";
pub const MISSING_CELL: &str = "n/a";

/// Everything the report formats. Nothing here is computed by the report.
pub struct ReportInput<'a> {
    pub region: &'a str,
    pub table: &'a IndicatorTable,
    pub stats: &'a [(&'static str, Dispersion)],
    pub charts: &'a [RenderedChart],
    pub sample_rows: usize,
}

/// A titled block of the document.
pub struct ReportSection {
    title: String,
    content_blocks: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content_blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content_blocks.push(content);
    }

    pub fn add_paragraph(&mut self, text: &str) {
        self.content_blocks.push(html! { p { (text) } });
    }

    pub fn add_list(&mut self, items: &[&str]) {
        self.content_blocks.push(html! {
            ul {
                @for item in items {
                    li { (item) }
                }
            }
        });
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content_blocks {
                    (block)
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Report {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn render(&self) -> Markup {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    style {
                        (PreEscaped("
                            body { font-family: Arial, sans-serif; max-width: 1100px; margin: 0 auto; padding: 20px; color: #222; }
                            h1 { border-bottom: 3px solid #1f77b4; padding-bottom: 8px; }
                            .subtitle { color: #666; margin-top: -10px; }
                            table { border-collapse: collapse; margin: 12px 0 24px; font-size: 13px; }
                            th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }
                            th { background: #f0f4f8; }
                            td.na { color: #999; font-style: italic; }
                            figure { margin: 16px 0; }
                            figure svg { max-width: 100%; height: auto; }
                            .table-wrap { overflow-x: auto; }
                        "))
                    }
                }
                body {
                    h1 { (self.title) }
                    p class="subtitle" { (self.subtitle) " · Generated on " (generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut file =
            fs::File::create(path).with_context(|| format!("creating report {:?}", path))?;
        file.write_all(self.render().into_string().as_bytes())
            .with_context(|| format!("writing report {:?}", path))?;
        Ok(())
    }
}

fn fmt_value(v: Option<f64>) -> Markup {
    match v {
        Some(v) => html! { td { (format!("{:.2}", v)) } },
        None => html! { td class="na" { (MISSING_CELL) } },
    }
}

fn fmt_stat(v: Option<f64>) -> Markup {
    match v {
        Some(v) => html! { td { (format!("{:.2}", v)) } },
        None => html! { td class="na" { (NOT_COMPUTABLE) } },
    }
}

fn short_label(column: &str) -> &str {
    match column {
        POPULATION => "Population",
        GDP => "GDP",
        INCOME => "Per-Capita Income",
        INCOME_INTERPOLATED => "Income (Interp.)",
        other => other,
    }
}

/// First rows of `table` restricted to `columns` (`Year` always first).
fn data_table(table: &IndicatorTable, columns: &[String], rows: usize) -> Result<Markup> {
    let sample = table.head(rows);
    let years = sample.years();
    let value_columns = columns
        .iter()
        .filter(|c| c.as_str() != YEAR)
        .map(|c| Ok((c.as_str(), sample.column(c)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(html! {
        div class="table-wrap" {
            table {
                thead {
                    tr {
                        th { (YEAR) }
                        @for (name, _) in &value_columns {
                            th { (name) }
                        }
                    }
                }
                tbody {
                    @for r in 0..sample.num_rows() {
                        tr {
                            td { (years.value(r)) }
                            @for (_, values) in &value_columns {
                                (fmt_value(value_at(values, r)))
                            }
                        }
                    }
                }
            }
        }
    })
}

fn stats_table(stats: &[(&'static str, Dispersion)]) -> Markup {
    type Pick = fn(&Dispersion) -> Option<f64>;
    let metrics: [(&str, Pick); 3] = [
        ("Mean", |d| d.mean),
        ("Variance", |d| d.variance),
        ("Standard Deviation", |d| d.std_dev),
    ];
    html! {
        table {
            thead {
                tr {
                    th { "Metric" }
                    @for (name, _) in stats {
                        th { (short_label(name)) }
                    }
                }
            }
            tbody {
                @for (metric, pick) in &metrics {
                    tr {
                        th { (metric) }
                        @for (_, d) in stats {
                            (fmt_stat(pick(d)))
                        }
                    }
                }
            }
        }
    }
}

fn chart_caption(kind: ChartKind, period: &str) -> String {
    match kind {
        ChartKind::Evolution => format!(
            "This chart shows the evolution of the Estimated Population, the Estimated GDP and \
             the Per-Capita Income (after interpolation) from {period}. The general upward trend \
             is visible, as are possible drops or stagnation, especially in periods of economic \
             instability."
        ),
        ChartKind::GdpDynamics => "This chart shows the velocity (annual rate of change) and the \
             acceleration of GDP. During the COVID period there is a sharp deceleration, \
             followed by a gradual recovery."
            .to_string(),
        ChartKind::IncomeMovingAverages => "This chart shows the Per-Capita Income (after \
             interpolation) and its 3- and 7-year moving averages. The averages smooth \
             short-term oscillations and bring out the long-term trend, even in the presence \
             of one-off variations."
            .to_string(),
    }
}

fn period_label(table: &IndicatorTable) -> String {
    let years = table.years();
    if years.is_empty() {
        "the observed period".to_string()
    } else {
        format!("{} to {}", years.value(0), years.value(years.len() - 1))
    }
}

/// Assemble the eight fixed sections.
pub fn build_report(input: &ReportInput<'_>) -> Result<Report> {
    let period = period_label(input.table);
    let mut report = Report::new(
        &format!("Data Analysis Report: {}", input.region),
        &format!("Population, GDP and per-capita income, {period}"),
    );

    let mut intro = ReportSection::new("1. Introduction");
    intro.add_paragraph(&format!(
        "This report analyses the Estimated Population, the Estimated GDP and the Per-Capita \
         Income of {region} from {period}. It covers both the original figures and the values \
         derived from them through interpolation, discrete derivatives and moving averages. \
         Particular attention is paid to the impact of COVID (roughly 2020-2021), which caused \
         significant swings in the indicators.",
        region = input.region,
    ));
    report.add_section(intro);

    let mut original = ReportSection::new("2. Original Data");
    original.add_paragraph("A sample of the original data as extracted from the spreadsheet:");
    let raw_columns: Vec<String> = [YEAR, POPULATION, GDP, INCOME]
        .iter()
        .map(|c| c.to_string())
        .collect();
    original.add_content(data_table(input.table, &raw_columns, input.sample_rows)?);
    report.add_section(original);

    let mut method = ReportSection::new("3. Calculation Process and Data Treatment");
    method.add_paragraph("The following steps were applied to obtain a more robust analysis:");
    method.add_list(&[
        "Linear interpolation: fills the missing values of 'Per-Capita Income', producing the \
         'Per-Capita Income (Interpolated)' column. Gaps at the start or end of the series are \
         left empty.",
        "Derivatives (velocity and acceleration): computed for each tracked indicator to show \
         the rate of change and how that rate itself changes. Population uses a 2-year interval, \
         since it is collected biennially in some years.",
        "Moving averages: 3- and 7-year trailing windows smooth oscillations and bring out \
         long-term trends.",
        "Dispersion measures: mean, sample variance and sample standard deviation quantify \
         how spread out each indicator is.",
    ]);
    report.add_section(method);

    let mut stats = ReportSection::new("4. Descriptive Statistics");
    stats.add_paragraph("Summary of the main dispersion measures of each indicator:");
    stats.add_content(stats_table(input.stats));
    report.add_section(stats);

    let mut visuals = ReportSection::new("5. Charts and Visual Analysis");
    visuals.add_paragraph(
        "The following charts show the evolution of the indicators, their derivatives (velocity \
         and acceleration) and their moving averages, to make trends and oscillations easier \
         to read.",
    );
    for chart in input.charts {
        let svg = fs::read_to_string(&chart.path)
            .with_context(|| format!("reading chart image {:?}", chart.path))?;
        visuals.add_content(html! {
            h3 { (chart.kind.title()) }
            figure {
                (PreEscaped(svg))
                figcaption { (chart_caption(chart.kind, &period)) }
            }
        });
    }
    report.add_section(visuals);

    let mut covid = ReportSection::new("6. Impact of the COVID Period");
    covid.add_paragraph(
        "The COVID period (roughly 2020-2021) had a significant impact on the indicators \
         analysed:",
    );
    covid.add_list(&[
        "GDP fell sharply during 2020 and 2021, reflecting the global economic slowdown.",
        "Per-capita income swung markedly, possibly due to job losses and reduced purchasing \
         power.",
        "Population, collected biennially in some years, shows variations that must be read \
         with caution, since the collection frequency can mask abrupt changes during the \
         pandemic.",
    ]);
    covid.add_paragraph(
        "These effects show why smoothing techniques such as moving averages, together with \
         the derivatives (velocity and acceleration), are needed to understand the dynamics of \
         the data in periods of crisis.",
    );
    report.add_section(covid);

    let mut processed = ReportSection::new("7. Processed Data and Formula Results");
    processed.add_paragraph(
        "A sample of the processed data, including the derivatives and moving averages. These \
         values were generated automatically from the original data.",
    );
    processed.add_content(data_table(
        input.table,
        &input.table.column_names(),
        input.sample_rows,
    )?);
    report.add_section(processed);

    let mut conclusions = ReportSection::new("8. Conclusions and Final Remarks");
    conclusions.add_paragraph("In summary, the analysis shows that:");
    conclusions.add_list(&[
        "Interpolation, derivatives and moving averages were key to smoothing oscillations \
         and highlighting the trends of the indicators over the years.",
        "The COVID period hit GDP and per-capita income, although there are signs of \
         post-pandemic recovery.",
        "Biennial population collection makes abrupt variations harder to interpret and calls \
         for caution.",
    ]);
    conclusions.add_paragraph(&format!(
        "Together these analyses give a deeper understanding of the socioeconomic dynamics of \
         {}, supporting well-founded decisions and public policy.",
        input.region
    ));
    report.add_section(conclusions);

    Ok(report)
}

/// Build the report and write it as a standalone HTML document.
#[tracing::instrument(level = "info", skip(input, path), fields(path = %path.as_ref().display()))]
pub fn write_report<P: AsRef<Path>>(input: &ReportInput<'_>, path: P) -> Result<()> {
    let path = path.as_ref();
    let report = build_report(input)?;
    report
        .save_to_file(path)
        .map_err(|e| ArtifactWriteError::new("report", path, e))?;
    info!(sections = report.sections().len(), "wrote report {}", path.display());
    Ok(())
}
