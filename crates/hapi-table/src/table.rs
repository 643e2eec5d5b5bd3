//! Tables backed by a chunked data request.

use futures::TryStreamExt;
use futures::stream::IntoAsyncRead;
use hapi_fetch::{
    ByteStream, ChunkProgress, ChunkStreamer, DEFAULT_CHUNK_LIMIT, DataService, LimitCallback,
    QueryStatus, Url, url::query_params,
};
use hapi_types::{HapiError, HapiParam, StreamFormat};
use std::sync::Arc;
use tracing::debug;

use crate::column::{ColumnInfo, ColumnReader};
use crate::header::parse_header;
use crate::rows::RowReader;

/// Byte reader over the concatenated chunk bodies.
pub type DataReader = IntoAsyncRead<ByteStream>;

/// A data request and the columns it is expected to return.
#[derive(Clone)]
pub struct HapiSource {
    service: Arc<dyn DataService>,
    data_url: Url,
    params: Vec<HapiParam>,
    chunk_limit: usize,
    on_limit: Option<LimitCallback>,
}

impl HapiSource {
    /// Creates a source for a complete data request URL.
    ///
    /// With no parameters supplied, the columns are taken from the header
    /// the request must then ask for with `include=header`.
    #[must_use]
    pub fn new(service: Arc<dyn DataService>, data_url: Url) -> Self {
        Self {
            service,
            data_url,
            params: Vec::new(),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            on_limit: None,
        }
    }

    /// Sets the expected parameters, time column first.
    #[must_use]
    pub fn with_params(mut self, params: Vec<HapiParam>) -> Self {
        self.params = params;
        self
    }

    /// Sets the maximum number of chunks.
    #[must_use]
    pub const fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.chunk_limit = chunk_limit;
        self
    }

    /// Sets the callback told when the chunk limit truncates the result.
    #[must_use]
    pub fn with_limit_callback(mut self, callback: LimitCallback) -> Self {
        self.on_limit = Some(callback);
        self
    }

    /// The data request URL.
    #[must_use]
    pub const fn data_url(&self) -> &Url {
        &self.data_url
    }

    /// Stream format named by the request, CSV if none.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Format`] for an unknown format name.
    pub fn format(&self) -> Result<StreamFormat, HapiError> {
        query_params(&self.data_url)
            .into_iter()
            .find(|(k, _)| k == StreamFormat::PARAM)
            .map_or(Ok(StreamFormat::default()), |(_, v)| v.parse())
    }

    /// Issues the request and returns a table over its rows.
    ///
    /// # Errors
    ///
    /// Returns any error of the first request, a malformed header, or a
    /// request that supplies no column metadata.
    pub async fn open_table(&self) -> Result<HapiTable, HapiError> {
        let format = self.format()?;
        let mut streamer = ChunkStreamer::new(Arc::clone(&self.service))
            .with_chunk_limit(self.chunk_limit);
        if let Some(callback) = &self.on_limit {
            streamer = streamer.with_limit_callback(Arc::clone(callback));
        }
        let (bytes, progress) = streamer.open(&self.data_url).await?.into_parts();
        let mut reader = bytes.into_async_read();

        let header = parse_header(&mut reader).await?;
        let params = if self.params.is_empty() {
            header
                .info()?
                .map(|info| info.parameters)
                .ok_or_else(|| {
                    HapiError::Format("data stream has no parameter metadata".to_string())
                })?
        } else {
            self.params.clone()
        };
        debug!("HAPI table with {} parameters in {} format", params.len(), format);

        let columns: Vec<ColumnReader> = params.iter().map(ColumnReader::new).collect();
        let rows = RowReader::open(reader, format, columns.clone(), header.overread).await?;
        Ok(HapiTable {
            columns,
            rows: Some(rows),
            progress: Some(progress),
        })
    }
}

impl std::fmt::Debug for HapiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapiSource")
            .field("data_url", &self.data_url.as_str())
            .field("params", &self.params.len())
            .field("chunk_limit", &self.chunk_limit)
            .finish_non_exhaustive()
    }
}

/// Column metadata plus, when backed by a request, its rows.
#[derive(Debug)]
pub struct HapiTable {
    columns: Vec<ColumnReader>,
    rows: Option<RowReader<DataReader>>,
    progress: Option<Arc<ChunkProgress>>,
}

impl HapiTable {
    /// Creates a table that describes columns but has no rows.
    #[must_use]
    pub fn metadata_only(params: &[HapiParam]) -> Self {
        Self {
            columns: params.iter().map(ColumnReader::new).collect(),
            rows: None,
            progress: None,
        }
    }

    /// Column metadata, in row order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().map(ColumnReader::info)
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.iter().map(ColumnReader::column_count).sum()
    }

    /// Returns true if the table has rows to read.
    #[must_use]
    pub const fn has_rows(&self) -> bool {
        self.rows.is_some()
    }

    /// The row reader.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Unsupported`] for a metadata-only table.
    pub fn rows(&mut self) -> Result<&mut RowReader<DataReader>, HapiError> {
        self.rows.as_mut().ok_or_else(no_rows)
    }

    /// Takes the row reader out of the table.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Unsupported`] for a metadata-only table.
    pub fn into_rows(self) -> Result<RowReader<DataReader>, HapiError> {
        self.rows.ok_or_else(no_rows)
    }

    /// The chunk progress record, if backed by a request.
    #[must_use]
    pub fn progress(&self) -> Option<Arc<ChunkProgress>> {
        self.progress.clone()
    }

    /// Whether the request delivered its whole interval.
    ///
    /// Final once every row has been read.
    #[must_use]
    pub fn status(&self) -> QueryStatus {
        self.progress
            .as_ref()
            .map_or(QueryStatus::Complete, |p| p.status())
    }
}

fn no_rows() -> HapiError {
    HapiError::Unsupported("table has metadata only".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use futures::stream;
    use hapi_types::{HapiType, ServiceError, iso_to_seconds, seconds_to_iso};
    use std::sync::Mutex;

    const HEADER: &str = "#{\"HAPI\":\"3.0\",\"parameters\":[\n#{\"name\":\"Time\",\"type\":\"isotime\",\"length\":20},\n#{\"name\":\"n\",\"type\":\"integer\"}]}\n";

    /// Serves one record per hour, refusing requests over `max_hours`.
    #[derive(Debug)]
    struct HourlyService {
        max_hours: f64,
        requests: Mutex<usize>,
    }

    impl HourlyService {
        fn new(max_hours: f64) -> Arc<Self> {
            Arc::new(Self {
                max_hours,
                requests: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl DataService for HourlyService {
        async fn open_stream(&self, url: &Url) -> Result<ByteStream, HapiError> {
            let params = query_params(url);
            let get = |name: &str| {
                params
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            };
            let start = iso_to_seconds(&get("start"))?;
            let stop = iso_to_seconds(&get("stop"))?;
            if (stop - start) / 3600.0 > self.max_hours {
                return Err(ServiceError::new(ServiceError::TOO_MUCH_DATA, "too much").into());
            }
            *self.requests.lock().unwrap() += 1;

            let mut body = String::new();
            if get("include") == "header" {
                body.push_str(HEADER);
            }
            let mut t = start;
            while t < stop {
                body.push_str(&format!("{},{}\n", seconds_to_iso(t)?, t / 3600.0 % 24.0));
                t += 3600.0;
            }
            Ok(stream::iter(vec![Ok(Bytes::from(body))]).boxed())
        }
    }

    fn url(query: &str) -> Url {
        Url::parse(&format!("https://example.org/hapi/data?dataset=X&{query}")).unwrap()
    }

    fn params() -> Vec<HapiParam> {
        vec![
            HapiParam::new("Time", HapiType::IsoTime).with_length(20),
            HapiParam::new("n", HapiType::Integer),
        ]
    }

    async fn collect(table: HapiTable) -> Vec<Vec<Value>> {
        table
            .into_rows()
            .unwrap()
            .into_rows()
            .map(Result::unwrap)
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_rows_with_given_params() {
        let service = HourlyService::new(2.0);
        let source = HapiSource::new(
            service.clone(),
            url("start=2024-01-01T00:00:00Z&stop=2024-01-01T08:00:00Z"),
        )
        .with_params(params());
        let table = source.open_table().await.unwrap();
        assert_eq!(table.column_count(), 2);
        let progress = table.progress().unwrap();

        let rows = collect(table).await;
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0][0], Value::Str("2024-01-01T00:00:00Z".into()));
        assert_eq!(rows[7][1], Value::Int(7));
        assert_eq!(*service.requests.lock().unwrap(), 4);
        assert_eq!(progress.status(), QueryStatus::Complete);
    }

    #[tokio::test]
    async fn test_params_from_header() {
        let service = HourlyService::new(4.0);
        let source = HapiSource::new(
            service,
            url("start=2024-01-01T00:00:00Z&stop=2024-01-01T08:00:00Z&include=header"),
        );
        let table = source.open_table().await.unwrap();
        let names: Vec<_> = table.columns().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Time", "n"]);
        assert!(table.columns().next().unwrap().is_time);

        let rows = collect(table).await;
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[4][1], Value::Int(4));
    }

    #[tokio::test]
    async fn test_missing_metadata() {
        let source = HapiSource::new(
            HourlyService::new(24.0),
            url("start=2024-01-01T00:00:00Z&stop=2024-01-01T02:00:00Z"),
        );
        assert!(matches!(
            source.open_table().await,
            Err(HapiError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_status() {
        let source = HapiSource::new(
            HourlyService::new(1.0),
            url("start=2024-01-01T00:00:00Z&stop=2024-01-01T04:00:00Z"),
        )
        .with_params(params())
        .with_chunk_limit(2);
        let table = source.open_table().await.unwrap();
        let progress = table.progress().unwrap();
        let rows = collect(table).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(progress.status(), QueryStatus::Overflow);
    }

    #[tokio::test]
    async fn test_metadata_only() {
        let mut table = HapiTable::metadata_only(&params());
        assert_eq!(table.column_count(), 2);
        assert!(!table.has_rows());
        assert!(matches!(table.rows(), Err(HapiError::Unsupported(_))));
        assert_eq!(table.status(), QueryStatus::Complete);
    }

    #[test]
    fn test_format_from_url() {
        let service = HourlyService::new(1.0);
        let csv = HapiSource::new(service.clone(), url("start=a&stop=b"));
        assert_eq!(csv.format().unwrap(), StreamFormat::Csv);
        let binary = HapiSource::new(service, url("start=a&stop=b&format=binary"));
        assert_eq!(binary.format().unwrap(), StreamFormat::Binary);
    }
}
