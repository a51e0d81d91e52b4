use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::parser::{Head, ParseError, parse_head};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// One client connection carrying a single request/response exchange.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    buffer: Vec<u8>,
    /// Head of the request being read, once its header block is complete.
    head: Option<Head>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(READ_CHUNK),
            head: None,
        }
    }

    /// Reads until a complete request is buffered.
    ///
    /// The head is parsed once; after that only the body length is awaited.
    /// Returns `Ok(None)` if the client closed the connection first. Parse
    /// failures come back as a [`ParseError`] inside the `anyhow::Error`.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            match self.head.take() {
                Some(head) => match head.body(&self.buffer) {
                    Some(body) => {
                        let body = body.to_vec();
                        self.buffer.drain(..head.request_len());
                        return Ok(Some(head.into_request(body)));
                    }
                    None => self.head = Some(head),
                },
                None => match parse_head(&self.buffer) {
                    Ok(head) => {
                        self.head = Some(head);
                        continue;
                    }
                    Err(ParseError::Incomplete) => {}
                    Err(e) => return Err(e.into()),
                },
            }

            self.buffer.reserve(READ_CHUNK);
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Writes `response` and closes the write half.
    pub async fn respond(&mut self, response: &Response) -> anyhow::Result<()> {
        let mut writer = ResponseWriter::new(response);
        writer.write_to_stream(&mut self.stream).await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn reads_request_split_across_writes() {
        let (client, server) = duplex(64);
        let mut conn = Connection::new(server);

        let writer = tokio::spawn(async move {
            let mut client = client;
            client.write_all(b"POST /save HTTP/1.1\r\nContent-").await.unwrap();
            client.write_all(b"Length: 3\r\n\r\nx=1").await.unwrap();
            client
        });

        let request = conn.read_request().await.unwrap().unwrap();
        assert_eq!(request.path, "/save");
        assert_eq!(request.body, b"x=1");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn closed_before_request_yields_none() {
        let (client, server) = duplex(64);
        drop(client);

        let mut conn = Connection::new(server);
        assert!(conn.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_refused_before_it_is_sent() {
        let (client, server) = duplex(256);
        let mut conn = Connection::new(server);

        let mut client = client;
        client
            .write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n")
            .await
            .unwrap();

        let err = conn.read_request().await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ParseError>(),
            Some(&ParseError::BodyTooLarge { declared: 99_999_999 })
        );
    }
}
