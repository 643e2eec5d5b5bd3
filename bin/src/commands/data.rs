//! Data command implementation.
//!
//! This module streams the records of a dataset to stdout as CSV, letting
//! the chunk streamer split intervals the server refuses as too large.

use crate::display::{DataFormat, csv_line, header_fields};
use anyhow::{Context, Result, bail};
use hapi_lib::prelude::*;
use hapi_lib::{ColumnInfo, parse_iso};
use std::io::{BufWriter, Write};
use std::sync::Arc;

/// Stream a dataset's records between `start` and `stop` to stdout.
pub(crate) async fn stream_data(
    service: HapiService,
    dataset: &str,
    start: &str,
    stop: &str,
    parameters: Option<&str>,
    format: DataFormat,
    chunk_limit: usize,
) -> Result<()> {
    parse_iso(start).with_context(|| format!("Invalid start time: {start}"))?;
    parse_iso(stop).with_context(|| format!("Invalid stop time: {stop}"))?;

    let version = service.catalog().await?.version();
    let info = service
        .info(version, dataset)
        .await
        .with_context(|| format!("Unknown dataset: {dataset}"))?;
    let params = select_parameters(&info.parameters, parameters)?;

    let format = StreamFormat::from(format);
    let mut query = vec![
        (version.dataset_param(), dataset.to_string()),
        (version.start_param(), start.to_string()),
        (version.stop_param(), stop.to_string()),
        (StreamFormat::PARAM, format.to_string()),
    ];
    if let Some(names) = parameters {
        query.insert(1, ("parameters", names.to_string()));
    }
    let url = service.create_query(HapiEndpoint::Data, &query)?;

    let callback: LimitCallback = Arc::new(|message: &str| eprintln!("warning: {message}"));
    let source = HapiSource::new(Arc::new(service), url)
        .with_params(params)
        .with_chunk_limit(chunk_limit)
        .with_limit_callback(callback);
    let mut table = source.open_table().await?;
    let columns: Vec<ColumnInfo> = table.columns().cloned().collect();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "{}", header_fields(&columns).join(","))?;

    let rows = table.rows()?;
    while rows.next().await? {
        writeln!(out, "{}", csv_line(rows.row()))?;
    }
    out.flush()?;

    if table.status().is_overflow() {
        eprintln!(
            "warning: output is incomplete; raise --chunk-limit (currently {chunk_limit}) to retrieve the whole interval"
        );
    }
    Ok(())
}

/// Picks the requested parameters, always keeping the leading time column.
fn select_parameters(all: &[HapiParam], names: Option<&str>) -> Result<Vec<HapiParam>> {
    let Some(names) = names else {
        return Ok(all.to_vec());
    };
    let wanted: Vec<&str> = names.split(',').map(str::trim).collect();
    for name in &wanted {
        if !all.iter().any(|p| p.name == *name) {
            bail!("Unknown parameter: {name}");
        }
    }
    Ok(all
        .iter()
        .enumerate()
        .filter(|(i, p)| *i == 0 || wanted.contains(&p.name.as_str()))
        .map(|(_, p)| p.clone())
        .collect())
}
