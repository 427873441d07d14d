//! Report artifacts for a [`ResultCollection`].

use std::io::Write;

use crate::BenchError;
use crate::result::ResultCollection;
use crate::sample::Metric;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Html,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Json, Format::Csv, Format::Html];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Html => "html",
        }
    }

    pub fn file_name(self) -> String {
        format!("report.{}", self.extension())
    }
}

pub fn render<W: Write>(
    format: Format,
    collection: &ResultCollection,
    writer: W,
) -> Result<(), BenchError> {
    match format {
        Format::Json => render_json(collection, writer),
        Format::Csv => render_csv(collection, writer),
        Format::Html => render_html(collection, writer),
    }
}

pub fn render_to_string(format: Format, collection: &ResultCollection) -> Result<String, BenchError> {
    let mut buffer = Vec::new();
    render(format, collection, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| BenchError::invalid_input(e.to_string()))
}

fn io_error(format: Format, err: impl std::fmt::Display) -> BenchError {
    BenchError::storage(format!("<{} report>", format.extension()), err.to_string())
}

pub fn render_json<W: Write>(collection: &ResultCollection, mut writer: W) -> Result<(), BenchError> {
    serde_json::to_writer_pretty(&mut writer, collection)
        .map_err(|e| io_error(Format::Json, e))?;
    writeln!(writer).map_err(|e| io_error(Format::Json, e))
}

const CSV_HEADER: &str = "\"title\";\"name\";\"unit\";\"batch\";\"elapsed\";\"error %\";\"instructions\";\"branches\";\"branch misses\";\"total\"";

pub fn render_csv<W: Write>(collection: &ResultCollection, mut writer: W) -> Result<(), BenchError> {
    writeln!(writer, "{CSV_HEADER}").map_err(|e| io_error(Format::Csv, e))?;
    for record in &collection.results {
        let counter = |metric: Metric| {
            record
                .statistic(metric)
                .map(|s| s.median.to_string())
                .unwrap_or_default()
        };
        writeln!(
            writer,
            "{};{};{};{};{};{};{};{};{};{}",
            quote(&record.title),
            quote(&record.name),
            quote(&record.unit),
            record.batch,
            record.median_elapsed(),
            record.statistics.mape_elapsed * 100.0,
            counter(Metric::Instructions),
            counter(Metric::BranchInstructions),
            counter(Metric::BranchMisses),
            record.total_time
        )
        .map_err(|e| io_error(Format::Csv, e))?;
    }
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

const HTML_HEAD: &str = r#"<html>

<head>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
</head>

<body>
    <div id="myDiv"></div>
    <script>
        var data = [
"#;

pub fn render_html<W: Write>(collection: &ResultCollection, mut writer: W) -> Result<(), BenchError> {
    let mut traces = Vec::with_capacity(collection.results.len());
    for record in &collection.results {
        let values: Vec<f64> = record.measurements.iter().map(|s| s.elapsed).collect();
        let trace = serde_json::json!({
            "name": record.name,
            "y": values,
            "type": "box",
        });
        traces.push(trace.to_string());
    }
    let title = serde_json::to_string(&collection.title).map_err(|e| io_error(Format::Html, e))?;
    write!(writer, "{HTML_HEAD}").map_err(|e| io_error(Format::Html, e))?;
    for trace in traces {
        writeln!(writer, "            {trace},").map_err(|e| io_error(Format::Html, e))?;
    }
    write!(
        writer,
        r#"        ];
        var title = {title};
        var layout = {{ title: {{ text: title }}, showlegend: false, yaxis: {{ title: 'time per unit', rangemode: 'tozero', autorange: true }} }};
        Plotly.newPlot('myDiv', data, layout, {{ responsive: true }});
    </script>
</body>

</html>
"#
    )
    .map_err(|e| io_error(Format::Html, e))
}
