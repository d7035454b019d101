use analysis_core::QuoteRecord;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::derive::{build_quote, ChartMeta};
use crate::error::MarketDataError;
use crate::symbols::to_provider_symbol;
use crate::MarketDataConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One upstream fetch attempt for a canonical symbol
#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    chart: Option<ChartBody>,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
}

#[derive(Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, provider_symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, provider_symbol)
    }
}

/// Extract the first result's meta, or fail with "no data".
fn parse_chart_body(body: &str) -> Result<ChartMeta, MarketDataError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    response
        .chart
        .and_then(|c| c.result)
        .and_then(|results| results.into_iter().next())
        .map(|r| r.meta)
        .ok_or(MarketDataError::NoData)
}

#[async_trait]
impl ChartSource for YahooChartClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let provider_symbol = to_provider_symbol(symbol);
        let url = self.chart_url(&provider_symbol);

        tracing::debug!("Fetching chart for {} ({})", symbol, provider_symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1m"), ("range", "1d")])
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout
                } else {
                    MarketDataError::Request(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout
            } else {
                MarketDataError::Request(e)
            }
        })?;

        let meta = parse_chart_body(&body)?;
        Ok(build_quote(
            symbol,
            &provider_symbol,
            &meta,
            Utc::now().timestamp_millis(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config_for(base_url: String, timeout: Duration) -> MarketDataConfig {
        MarketDataConfig {
            base_url,
            timeout,
            cache_ttl: Duration::from_secs(60),
        }
    }

    async fn read_headers(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Local HTTP endpoint that answers one request after `delay`
    async fn serve_once(status_line: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_headers(&mut socket).await;
            tokio::time::sleep(delay).await;
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_chart_body() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"GC=F","regularMarketPrice":2300.5,"previousClose":2290.0,"currency":"USD","marketState":"REGULAR"}}],"error":null}}"#;
        let meta = parse_chart_body(body).unwrap();
        assert_eq!(meta.symbol.as_deref(), Some("GC=F"));
        assert_eq!(meta.regular_market_price, Some(2300.5));
        assert_eq!(meta.previous_close, Some(2290.0));
    }

    #[test]
    fn test_parse_chart_body_without_results() {
        let empty = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_chart_body(empty), Err(MarketDataError::NoData)));

        let null = r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(parse_chart_body(null), Err(MarketDataError::NoData)));

        assert!(matches!(parse_chart_body("<html>"), Err(MarketDataError::Parse(_))));
    }

    #[test]
    fn test_chart_url() {
        let config = MarketDataConfig {
            base_url: "https://example.test/".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        };
        let client = YahooChartClient::new(&config).unwrap();
        assert_eq!(client.chart_url("^GSPC"), "https://example.test/v8/finance/chart/^GSPC");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let base = serve_once("503 Service Unavailable", "", Duration::ZERO).await;
        let client = YahooChartClient::new(&config_for(base, Duration::from_secs(5))).unwrap();

        match client.fetch_quote("EURUSD").await {
            Err(MarketDataError::Status { status, reason }) => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stalled_upstream_times_out() {
        let base = serve_once("200 OK", "{}", Duration::from_secs(3)).await;
        let client = YahooChartClient::new(&config_for(base, Duration::from_millis(200))).unwrap();

        let result = client.fetch_quote("EURUSD").await;
        assert!(matches!(result, Err(MarketDataError::Timeout)), "{:?}", result);
    }

    #[tokio::test]
    async fn test_fetch_quote_from_chart_body() {
        let base = serve_once(
            "200 OK",
            concat!(
                r#"{"chart":{"result":[{"meta":{"symbol":"EURUSD=X","regularMarketPrice":1.1,"#,
                r#""previousClose":1.09,"currency":"USD"}}],"error":null}}"#,
            ),
            Duration::ZERO,
        )
        .await;
        let client = YahooChartClient::new(&config_for(base, Duration::from_secs(5))).unwrap();

        let quote = client.fetch_quote("EURUSD").await.unwrap();
        assert_eq!(quote.symbol, "EURUSD");
        assert_eq!(quote.price, 1.1);
    }

    #[tokio::test]
    #[ignore] // Hits the live endpoint
    async fn test_fetch_live_quote() {
        let client = YahooChartClient::new(&MarketDataConfig::default()).unwrap();
        let quote = client.fetch_quote("EURUSD").await.unwrap();
        println!("EURUSD: {} ({})", quote.price, quote.market_state);
        assert!(quote.price > 0.0);
    }
}
