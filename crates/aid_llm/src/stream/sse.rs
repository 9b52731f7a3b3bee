use std::{io, pin::Pin};

use async_stream::try_stream;
use futures::{Stream, StreamExt as _, TryStreamExt as _, stream};
use tokio_util::{
    codec::{FramedRead, LinesCodec},
    io::StreamReader,
};
use tracing::trace;

use crate::error::{Error, Result};

/// The `data:` payloads of a server-sent event stream, in order.
pub type DataStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Read the `data:` payloads from a streaming HTTP response body.
pub(crate) fn from_response(response: reqwest::Response) -> DataStream {
    let bytes = response.bytes_stream().map_err(io::Error::other);
    let lines = FramedRead::new(StreamReader::new(bytes), LinesCodec::new())
        .map_err(|error| Error::Stream(error.to_string()));

    data_payloads(lines)
}

/// Read the `data:` payloads from a complete event stream body.
pub(crate) fn from_body(body: &str) -> DataStream {
    let lines = body
        .lines()
        .map(|line| Ok(line.to_owned()))
        .collect::<Vec<_>>();

    data_payloads(stream::iter(lines))
}

fn data_payloads<S>(lines: S) -> DataStream
where
    S: Stream<Item = Result<String>> + Send + 'static,
{
    Box::pin(try_stream! {
        let mut lines = Box::pin(lines);

        while let Some(line) = lines.next().await {
            let line = line?;

            // Event names, comments and keep-alives carry nothing we need.
            if !line.starts_with("data:") {
                continue;
            }

            let data = line.trim_start_matches("data:").trim();
            trace!(data, "Received chunk.");

            yield data.to_owned();
        }
    })
}
